#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glossa_core::error::ProviderError;
use glossa_core::{AppConfig, DictRegistry, DictionaryProvider};
use serde_json::{json, Value};

/// Resolves with a fixed value and counts calls.
pub struct StaticProvider {
    pub name: &'static str,
    pub result: Value,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(name: &'static str, result: Value) -> Arc<Self> {
        Arc::new(Self {
            name,
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DictionaryProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "static test provider"
    }

    async fn search(&self, _text: &str, _config: &AppConfig) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// Rejects with a provider-defined payload.
pub struct FailingProvider {
    pub name: &'static str,
    pub error: Value,
}

#[async_trait]
impl DictionaryProvider for FailingProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, _text: &str, _config: &AppConfig) -> Result<Value, ProviderError> {
        Err(ProviderError::Payload(self.error.clone()))
    }
}

/// Echoes the query after a delay.
pub struct DelayedProvider {
    pub name: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl DictionaryProvider for DelayedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, text: &str, _config: &AppConfig) -> Result<Value, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(json!({ "echo": text, "from": self.name }))
    }
}

pub struct PanickingProvider;

#[async_trait]
impl DictionaryProvider for PanickingProvider {
    fn name(&self) -> &'static str {
        "boom"
    }

    async fn search(&self, _text: &str, _config: &AppConfig) -> Result<Value, ProviderError> {
        panic!("parser exploded")
    }
}

/// Returns the config snapshot it was called with.
pub struct ConfigEchoProvider {
    pub name: &'static str,
}

#[async_trait]
impl DictionaryProvider for ConfigEchoProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, _text: &str, config: &AppConfig) -> Result<Value, ProviderError> {
        Ok(config.to_value())
    }
}

/// Registry with `fast`, `slow`, `broken` and `echo` dictionaries.
pub fn test_registry() -> DictRegistry {
    let mut registry = DictRegistry::new();
    registry.register_provider(Arc::new(DelayedProvider {
        name: "fast",
        delay: Duration::from_millis(5),
    }));
    registry.register_provider(Arc::new(DelayedProvider {
        name: "slow",
        delay: Duration::from_millis(80),
    }));
    registry.register_provider(Arc::new(FailingProvider {
        name: "broken",
        error: json!({"status": 500, "reason": "upstream down"}),
    }));
    registry.register_provider(Arc::new(ConfigEchoProvider { name: "echo" }));
    registry
}

/// A config that differs from the default in an easy-to-spot way.
pub fn custom_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.active = false;
    config.dicts.selected = vec!["urban".to_string()];
    config
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
