//! Wire types exchanged between tabs and the background service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message kind for a dictionary lookup.
pub const SEARCH_TEXT: &str = "SEARCH_TEXT";

/// Error reported when a lookup names an unregistered dictionary.
pub const MISSING_DICTIONARY: &str = "Missing Dictionary!";

pub type TabId = u64;

/// A message from any context, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub payload: Value,

    /// Marks the message for pass-through back to the sender's tab.
    #[serde(rename = "self", default, skip_serializing_if = "std::ops::Not::not")]
    pub relay: bool,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            relay: false,
        }
    }

    pub fn search_text(dict: impl Into<String>, text: impl Into<String>) -> Self {
        let payload = SearchTextPayload {
            dict: dict.into(),
            text: text.into(),
        };
        Self::new(
            SEARCH_TEXT,
            serde_json::to_value(payload).unwrap_or(Value::Null),
        )
    }

    pub fn relayed(mut self) -> Self {
        self.relay = true;
        self
    }
}

/// Where an inbound message came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Sender {
    pub fn tab(tab_id: TabId) -> Self {
        Self {
            tab_id: Some(tab_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTextPayload {
    pub dict: String,
    pub text: String,
}

/// Reply to a `SEARCH_TEXT` message. Both arms carry the dictionary id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Found { result: Value, dict: String },
    Failed { error: Value, dict: String },
}

impl SearchResponse {
    pub fn dict(&self) -> &str {
        match self {
            SearchResponse::Found { dict, .. } | SearchResponse::Failed { dict, .. } => dict,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SearchResponse::Failed { .. })
    }

    pub fn missing(dict: impl Into<String>) -> Self {
        SearchResponse::Failed {
            error: Value::String(MISSING_DICTIONARY.to_string()),
            dict: dict.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
