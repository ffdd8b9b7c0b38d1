//! Single entry point for inbound messages.
//!
//! A message is either relayed back to its sender's tab (when tagged
//! `self`) or handed to the one handler that claimed its `type`. Messages
//! nobody claimed get no response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::dispatcher::SearchDispatcher;
use crate::message::{Envelope, SearchTextPayload, Sender, TabId, SEARCH_TEXT};

/// Handles one message kind. `None` means no response is sent.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: Value, sender: &Sender) -> Option<Value>;
}

/// Outbound half of the message API: deliver an envelope to a tab and wait
/// for its reply.
#[async_trait]
pub trait TabMessenger: Send + Sync {
    async fn send_to_tab(&self, tab_id: TabId, envelope: Envelope) -> Result<Value, RelayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("tab {0} is gone")]
    TabClosed(TabId),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("a handler for '{0}' is already registered")]
    HandlerExists(String),
}

pub struct MessageRouter {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
    messenger: Option<Arc<dyn TabMessenger>>,
    relay_timeout: Option<Duration>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            messenger: None,
            relay_timeout: None,
        }
    }

    pub fn with_messenger(mut self, messenger: Arc<dyn TabMessenger>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    pub fn with_relay_timeout(mut self, relay_timeout: Option<Duration>) -> Self {
        self.relay_timeout = relay_timeout;
        self
    }

    /// Claim `kind` for `handler`. Each kind has at most one handler.
    pub fn on(
        &mut self,
        kind: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), RouterError> {
        let kind = kind.into();
        if self.handlers.contains_key(&kind) {
            return Err(RouterError::HandlerExists(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Router with the `SEARCH_TEXT` handler installed.
    pub fn with_search(dispatcher: SearchDispatcher) -> Self {
        let mut router = Self::new();
        router
            .handlers
            .insert(SEARCH_TEXT.to_string(), Arc::new(SearchTextHandler::new(dispatcher)));
        router
    }

    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Route one inbound message. Resolves once the reply is known.
    pub async fn route(&self, envelope: Envelope, sender: Sender) -> Option<Value> {
        if envelope.relay {
            return self.relay(envelope, &sender).await;
        }

        let Some(handler) = self.handlers.get(&envelope.kind) else {
            debug!(kind = %envelope.kind, "no handler, ignoring message");
            return None;
        };
        let handler = Arc::clone(handler);
        handler.handle(envelope.payload, &sender).await
    }

    async fn relay(&self, envelope: Envelope, sender: &Sender) -> Option<Value> {
        let Some(messenger) = self.messenger.as_ref() else {
            warn!(kind = %envelope.kind, "relay requested but no tab messenger is attached");
            return None;
        };
        let Some(tab_id) = sender.tab_id else {
            warn!(kind = %envelope.kind, "relay requested by a sender without a tab");
            return None;
        };

        debug!(tab_id, kind = %envelope.kind, "relaying message to tab");
        let forwarded = messenger.send_to_tab(tab_id, envelope);
        let outcome = match self.relay_timeout {
            Some(limit) => match timeout(limit, forwarded).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RelayError::Timeout(limit)),
            },
            None => forwarded.await,
        };

        match outcome {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(tab_id, "relay failed: {}", e);
                None
            }
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// `SEARCH_TEXT` → [`SearchDispatcher`].
pub struct SearchTextHandler {
    dispatcher: SearchDispatcher,
}

impl SearchTextHandler {
    pub fn new(dispatcher: SearchDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl MessageHandler for SearchTextHandler {
    async fn handle(&self, payload: Value, _sender: &Sender) -> Option<Value> {
        let request: SearchTextPayload = match serde_json::from_value(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!("malformed SEARCH_TEXT payload: {}", e);
                return None;
            }
        };
        let response = self.dispatcher.search(&request.dict, &request.text).await;
        Some(response.to_value())
    }
}
