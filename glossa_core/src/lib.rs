// src/lib.rs
pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod install;
pub mod message;
pub mod providers;
pub mod router;
pub mod service;
pub mod settings;
pub mod storage;
pub mod transport;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

pub use crate::config::AppConfig;
use crate::error::ProviderError;
pub use crate::settings::{ConfigSyncPolicy, Settings};

#[async_trait]
pub trait DictionaryProvider: Send + Sync {
    /// Returns the logical name of the dictionary. The registry id is this
    /// name lowercased.
    fn name(&self) -> &'static str;

    /// Returns a short description for listings.
    fn description(&self) -> &'static str {
        ""
    }

    /// Look `text` up with the entry's current configuration snapshot.
    ///
    /// The result shape is owned by the provider; nothing between here and
    /// the UI inspects it.
    async fn search(&self, text: &str, config: &AppConfig) -> Result<Value, ProviderError>;
}

/// A provider paired with its active configuration snapshot.
pub struct DictEntry {
    search: Arc<dyn DictionaryProvider>,
    config: RwLock<Arc<AppConfig>>,
}

impl DictEntry {
    fn new(search: Arc<dyn DictionaryProvider>, config: AppConfig) -> Self {
        Self {
            search,
            config: RwLock::new(Arc::new(config)),
        }
    }

    pub fn provider(&self) -> &Arc<dyn DictionaryProvider> {
        &self.search
    }

    /// The config the next search will see.
    pub async fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&*self.config.read().await)
    }

    async fn replace_config(&self, config: AppConfig) {
        *self.config.write().await = Arc::new(config);
    }
}

/// Dictionary id to entry. The set of ids is fixed once construction ends;
/// only the per-entry configs change afterwards.
pub struct DictRegistry {
    entries: HashMap<String, DictEntry>,
    defaults: AppConfig,
    policy: ConfigSyncPolicy,
    // Held across a whole `set_configs` pass.
    sync_lock: Mutex<()>,
}

impl DictRegistry {
    pub fn new() -> Self {
        Self::with_defaults(AppConfig::default_config().clone())
    }

    /// A registry whose entries start from (and reset to) `defaults`.
    pub fn with_defaults(defaults: AppConfig) -> Self {
        DictRegistry {
            entries: HashMap::new(),
            defaults,
            policy: ConfigSyncPolicy::default(),
            sync_lock: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: ConfigSyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ConfigSyncPolicy {
        self.policy
    }

    pub fn defaults(&self) -> &AppConfig {
        &self.defaults
    }

    /// Register a provider under its lowercased name. An existing entry with
    /// the same id is replaced.
    pub fn register_provider(&mut self, provider: Arc<dyn DictionaryProvider>) {
        let id = provider.name().to_lowercase();
        let entry = DictEntry::new(provider, self.defaults.clone());
        if self.entries.insert(id.clone(), entry).is_some() {
            debug!(dict = %id, "provider replaced an earlier registration");
        }
    }

    pub fn get(&self, id: &str) -> Option<&DictEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list_dicts(&self) -> Vec<DictInfo> {
        self.ids()
            .into_iter()
            .filter_map(|id| {
                self.entries.get(&id).map(|entry| DictInfo {
                    description: entry.search.description().to_string(),
                    id,
                })
            })
            .collect()
    }

    pub async fn config_of(&self, id: &str) -> Option<Arc<AppConfig>> {
        match self.entries.get(id) {
            Some(entry) => Some(entry.config().await),
            None => None,
        }
    }

    /// Replace every entry's config wholesale.
    ///
    /// Under [`ConfigSyncPolicy::ResetToDefault`] `incoming` is ignored and
    /// each entry gets a fresh copy of the defaults.
    ///
    /// Concurrent calls run one after another, so once they settle every
    /// entry holds the config of the same call. A search that starts while a
    /// pass is running may still see its entry's old config.
    pub async fn set_configs(&self, incoming: &AppConfig) {
        let _pass = self.sync_lock.lock().await;
        let source = match self.policy {
            ConfigSyncPolicy::ResetToDefault => &self.defaults,
            ConfigSyncPolicy::ApplyIncoming => incoming,
        };
        for entry in self.entries.values() {
            entry.replace_config(source.clone()).await;
        }
        debug!(entries = self.entries.len(), policy = ?self.policy, "configs replaced");
    }
}

impl Default for DictRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a registry holding only providers enabled via Cargo features.
pub fn build_registry_enabled_only(policy: ConfigSyncPolicy) -> DictRegistry {
    #[allow(unused_mut)]
    let mut registry = DictRegistry::new().with_policy(policy);

    #[cfg(feature = "youdao")]
    {
        match providers::youdao::YoudaoProvider::new() {
            Ok(provider) => registry.register_provider(Arc::new(provider)),
            Err(e) => tracing::warn!("youdao provider unavailable: {}", e),
        }
    }

    #[cfg(feature = "urban")]
    {
        match providers::urban::UrbanProvider::new() {
            Ok(provider) => registry.register_provider(Arc::new(provider)),
            Err(e) => tracing::warn!("urban provider unavailable: {}", e),
        }
    }

    registry
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DictInfo {
    pub id: String,
    pub description: String,
}
