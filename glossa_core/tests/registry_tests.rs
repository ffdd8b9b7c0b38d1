mod common;

use std::sync::Arc;

use common::{custom_config, test_registry, StaticProvider};
use glossa_core::{AppConfig, ConfigSyncPolicy, DictRegistry};
use serde_json::json;

#[tokio::test]
async fn test_entries_start_from_defaults() {
    let registry = test_registry();
    assert_eq!(registry.ids(), vec!["broken", "echo", "fast", "slow"]);
    for id in registry.ids() {
        let config = registry.config_of(&id).await.unwrap();
        assert_eq!(*config, *AppConfig::default_config());
    }
}

#[tokio::test]
async fn test_set_configs_resets_to_default_and_ignores_argument() {
    let registry = test_registry();
    assert_eq!(registry.policy(), ConfigSyncPolicy::ResetToDefault);

    registry.set_configs(&custom_config()).await;

    for id in registry.ids() {
        let config = registry.config_of(&id).await.unwrap();
        assert_eq!(*config, *registry.defaults());
        assert!(config.active);
    }
}

#[tokio::test]
async fn test_set_configs_applies_incoming_when_configured() {
    let registry = test_registry().with_policy(ConfigSyncPolicy::ApplyIncoming);
    let custom = custom_config();

    registry.set_configs(&custom).await;

    for id in registry.ids() {
        assert_eq!(*registry.config_of(&id).await.unwrap(), custom);
    }
}

#[tokio::test]
async fn test_entries_hold_independent_snapshots() {
    let registry = test_registry().with_policy(ConfigSyncPolicy::ApplyIncoming);
    let before = registry.config_of("fast").await.unwrap();

    registry.set_configs(&custom_config()).await;

    // A snapshot taken earlier is unaffected by the replacement.
    assert!(before.active);
    assert!(!registry.config_of("fast").await.unwrap().active);
    assert!(!Arc::ptr_eq(
        &registry.config_of("fast").await.unwrap(),
        &registry.config_of("slow").await.unwrap()
    ));
}

#[test]
fn test_ids_are_lowercased_and_last_registration_wins() {
    let mut registry = DictRegistry::new();
    let first = StaticProvider::new("Bing", json!("first"));
    let second = StaticProvider::new("BING", json!("second"));
    registry.register_provider(first);
    registry.register_provider(second.clone());

    assert_eq!(registry.len(), 1);
    assert!(registry.contains("bing"));
    assert!(!registry.contains("Bing"));

    let entry = registry.get("bing").unwrap();
    let provider: Arc<dyn glossa_core::DictionaryProvider> = second;
    assert!(Arc::ptr_eq(entry.provider(), &provider));
}

#[test]
fn test_list_dicts_is_sorted_with_descriptions() {
    let mut registry = DictRegistry::new();
    registry.register_provider(StaticProvider::new("zeta", json!(null)));
    registry.register_provider(StaticProvider::new("alpha", json!(null)));

    let listed = registry.list_dicts();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, "alpha");
    assert_eq!(listed[1].id, "zeta");
    assert_eq!(listed[0].description, "static test provider");
}

#[test]
fn test_enabled_registry_uses_policy() {
    let registry = glossa_core::build_registry_enabled_only(ConfigSyncPolicy::ApplyIncoming);
    assert_eq!(registry.policy(), ConfigSyncPolicy::ApplyIncoming);
    #[cfg(feature = "youdao")]
    assert!(registry.contains("youdao"));
    #[cfg(feature = "urban")]
    assert!(registry.contains("urban"));
}
