//! Keeps registry configs in step with the persisted `config` key.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, CONFIG_KEY};
use crate::storage::{StorageArea, StoreError};
use crate::DictRegistry;

pub struct ConfigBridge {
    handle: JoinHandle<()>,
}

impl ConfigBridge {
    /// Apply the stored config (if any) and follow every later change.
    ///
    /// The subscription is taken before the initial read so no change slips
    /// between the two.
    pub async fn start(
        registry: Arc<DictRegistry>,
        sync: Arc<dyn StorageArea>,
    ) -> Result<Self, StoreError> {
        let mut changes = sync.subscribe();

        match sync.get(CONFIG_KEY).await? {
            Some(value) => apply(&registry, value).await,
            None => debug!("no stored config, entries keep defaults"),
        }

        let handle = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.key == CONFIG_KEY => match change.new_value {
                        Some(value) => apply(&registry, value).await,
                        None => debug!("stored config removed, entries unchanged"),
                    },
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "config change notifications dropped, re-reading");
                        match sync.get(CONFIG_KEY).await {
                            Ok(Some(value)) => apply(&registry, value).await,
                            Ok(None) => {}
                            Err(e) => warn!("failed to re-read config: {}", e),
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("config bridge stopped");
        });

        info!("config bridge listening for '{}' changes", CONFIG_KEY);
        Ok(Self { handle })
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

async fn apply(registry: &DictRegistry, value: Value) {
    match serde_json::from_value::<AppConfig>(value) {
        Ok(config) => registry.set_configs(&config).await,
        Err(e) => warn!("ignoring unreadable stored config: {}", e),
    }
}
