use crate::error::ProviderError;
use crate::{AppConfig, DictionaryProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub mod parse;

use parse::{parse_document, Sections};

const BASE_URL: &str = "https://dict.youdao.com/w";

pub struct YoudaoProvider {
    client: Client,
    base_url: String,
}

impl YoudaoProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at another host, e.g. a local mirror.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = super::http_client(super::REQUEST_TIMEOUT)?;
        Ok(YoudaoProvider {
            client,
            base_url: base_url.into(),
        })
    }

    fn word_url(&self, text: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(text)
        )
    }
}

#[async_trait]
impl DictionaryProvider for YoudaoProvider {
    fn name(&self) -> &'static str {
        "youdao"
    }

    fn description(&self) -> &'static str {
        "Youdao dictionary: phonetics, basic meanings, phrases and example sentences."
    }

    async fn search(&self, text: &str, config: &AppConfig) -> Result<Value, ProviderError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::InvalidInput("empty search text".to_string()));
        }

        let settings = config.dict(self.name());
        let sections = Sections {
            basic: settings.option_bool("basic", true),
            phrase: settings.option_bool("phrase", true),
            sentence: settings.option_bool("sentence", true),
        };

        let url = self.word_url(text);
        debug!(%url, "youdao lookup");
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let result = parse_document(&body, sections)?;
        Ok(serde_json::to_value(result)?)
    }
}
