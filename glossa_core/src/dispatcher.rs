//! Turns a `(dict, text)` lookup into a [`SearchResponse`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::message::SearchResponse;
use crate::DictRegistry;

#[derive(Clone)]
pub struct SearchDispatcher {
    registry: Arc<DictRegistry>,
}

impl SearchDispatcher {
    pub fn new(registry: Arc<DictRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<DictRegistry> {
        &self.registry
    }

    /// Run one lookup. Every outcome, including an unknown dictionary or a
    /// panicking provider, comes back as a response value.
    pub async fn search(&self, dict: &str, text: &str) -> SearchResponse {
        let Some(entry) = self.registry.get(dict) else {
            debug!(dict, "lookup for unregistered dictionary");
            return SearchResponse::missing(dict);
        };

        let config = entry.config().await;
        let provider = Arc::clone(entry.provider());

        let outcome = AssertUnwindSafe(provider.search(text, &config))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ProviderError::Panicked(panic_message(&*panic))));

        match outcome {
            Ok(result) => SearchResponse::Found {
                result,
                dict: dict.to_string(),
            },
            Err(err) => {
                warn!(dict, code = err.code_str(), "search failed: {}", err);
                SearchResponse::Failed {
                    error: err.to_value(),
                    dict: dict.to_string(),
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
