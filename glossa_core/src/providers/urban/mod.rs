use crate::error::ProviderError;
use crate::{AppConfig, DictionaryProvider};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFINE_URL: &str = "https://api.urbandictionary.com/v0/define";

fn default_result_num() -> u64 {
    4
}

// Urban marks cross references as [term].
static LINK_MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]").expect("static regex"));

#[derive(Debug, Deserialize)]
pub struct DefineResponse {
    #[serde(default)]
    pub list: Vec<RawDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct RawDefinition {
    pub word: String,
    pub definition: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub thumbs_up: i64,
    #[serde(default)]
    pub thumbs_down: i64,
    #[serde(default)]
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub word: String,
    pub definition: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub example: String,
    pub thumbs_up: i64,
    pub thumbs_down: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

fn strip_links(s: &str) -> String {
    LINK_MARKUP.replace_all(s.trim(), "$1").into_owned()
}

/// Keep at most `limit` definitions with link markup removed.
pub fn shape_definitions(response: DefineResponse, limit: usize) -> Vec<Definition> {
    response
        .list
        .into_iter()
        .take(limit)
        .map(|raw| Definition {
            word: raw.word,
            definition: strip_links(&raw.definition),
            example: strip_links(&raw.example),
            thumbs_up: raw.thumbs_up,
            thumbs_down: raw.thumbs_down,
            permalink: raw.permalink,
        })
        .collect()
}

pub struct UrbanProvider {
    client: Client,
    define_url: String,
}

impl UrbanProvider {
    pub fn new() -> Result<Self, ProviderError> {
        let client = super::http_client(super::REQUEST_TIMEOUT)?;
        Ok(UrbanProvider {
            client,
            define_url: DEFINE_URL.to_string(),
        })
    }
}

#[async_trait]
impl DictionaryProvider for UrbanProvider {
    fn name(&self) -> &'static str {
        "urban"
    }

    fn description(&self) -> &'static str {
        "Urban Dictionary: crowd-sourced slang definitions."
    }

    async fn search(&self, text: &str, config: &AppConfig) -> Result<Value, ProviderError> {
        let term = text.trim();
        if term.is_empty() {
            return Err(ProviderError::InvalidInput("empty search text".to_string()));
        }
        let limit = config
            .dict(self.name())
            .option_u64("result_num", default_result_num()) as usize;

        let response: DefineResponse = self
            .client
            .get(&self.define_url)
            .query(&[("term", term)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let definitions = shape_definitions(response, limit);
        if definitions.is_empty() {
            return Err(ProviderError::NoResult);
        }
        Ok(serde_json::to_value(definitions)?)
    }
}
