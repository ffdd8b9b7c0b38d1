//! The background service: registry, router and config bridge wired
//! together over one pair of storage areas.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::bridge::ConfigBridge;
use crate::dispatcher::SearchDispatcher;
use crate::install::{handle_installed, InstallDetails, InstallError, InstallOutcome};
use crate::message::{Envelope, Sender};
use crate::router::{MessageRouter, TabMessenger};
use crate::settings::Settings;
use crate::storage::{Storage, StoreError};
use crate::DictRegistry;

pub struct Background {
    registry: Arc<DictRegistry>,
    router: Arc<MessageRouter>,
    storage: Storage,
    bridge: ConfigBridge,
}

impl Background {
    /// Start the config bridge and build the router. `messenger` carries
    /// relayed messages back to tabs; without one, relays get no reply.
    pub async fn start(
        registry: DictRegistry,
        storage: Storage,
        messenger: Option<Arc<dyn TabMessenger>>,
        settings: &Settings,
    ) -> Result<Self, StoreError> {
        let registry = Arc::new(registry);
        let bridge = ConfigBridge::start(Arc::clone(&registry), Arc::clone(&storage.sync)).await?;

        let mut router = MessageRouter::with_search(SearchDispatcher::new(Arc::clone(&registry)))
            .with_relay_timeout(settings.relay_timeout());
        if let Some(messenger) = messenger {
            router = router.with_messenger(messenger);
        }

        info!(
            dicts = registry.len(),
            policy = ?registry.policy(),
            "background service started"
        );

        Ok(Self {
            registry,
            router: Arc::new(router),
            storage,
            bridge,
        })
    }

    pub fn registry(&self) -> &Arc<DictRegistry> {
        &self.registry
    }

    pub fn router(&self) -> Arc<MessageRouter> {
        Arc::clone(&self.router)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub async fn handle_message(&self, envelope: Envelope, sender: Sender) -> Option<Value> {
        self.router.route(envelope, sender).await
    }

    pub async fn on_installed(
        &self,
        details: &InstallDetails,
    ) -> Result<InstallOutcome, InstallError> {
        handle_installed(details, &self.storage, &self.registry).await
    }

    pub fn shutdown(self) {
        self.bridge.stop();
    }
}
