// src/error.rs
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpRequest(reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No result")]
    NoResult,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Provider panicked: {0}")]
    Panicked(String),

    /// Provider-defined error shape, forwarded to the caller untouched.
    #[error("{0}")]
    Payload(Value),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else {
            ProviderError::HttpRequest(err)
        }
    }
}

impl ProviderError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ProviderError::InvalidInput(_) => "invalid_input",
            ProviderError::NoResult => "no_result",
            ProviderError::ParseError(_) => "parse_error",
            ProviderError::SerdeJson(_) => "parse_error",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::HttpRequest(_) => "upstream_error",
            ProviderError::Panicked(_) => "internal_error",
            ProviderError::Payload(_) => "provider_error",
            _ => "internal_error",
        }
    }

    /// Render the error as the `error` field of a response envelope.
    pub fn to_value(&self) -> Value {
        match self {
            ProviderError::Payload(value) => value.clone(),
            err => json!({
                "code": err.code_str(),
                "message": err.to_string(),
            }),
        }
    }
}
