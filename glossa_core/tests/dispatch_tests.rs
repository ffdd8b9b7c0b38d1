mod common;

use std::sync::Arc;

use common::{test_registry, PanickingProvider, StaticProvider};
use glossa_core::dispatcher::SearchDispatcher;
use glossa_core::message::{SearchResponse, MISSING_DICTIONARY};
use glossa_core::{ConfigSyncPolicy, DictRegistry};
use serde_json::json;

fn dispatcher(registry: DictRegistry) -> SearchDispatcher {
    SearchDispatcher::new(Arc::new(registry))
}

#[tokio::test]
async fn test_missing_dictionary_never_calls_a_provider() {
    let mut registry = DictRegistry::new();
    let only = StaticProvider::new("only", json!("hit"));
    registry.register_provider(only.clone());
    let dispatcher = dispatcher(registry);

    let response = dispatcher.search("nope", "love").await;

    assert_eq!(
        response,
        SearchResponse::Failed {
            error: json!(MISSING_DICTIONARY),
            dict: "nope".to_string(),
        }
    );
    assert_eq!(only.calls(), 0);
}

#[tokio::test]
async fn test_resolved_search_is_wrapped_with_dict() {
    let mut registry = DictRegistry::new();
    let result = json!({"title": "love", "basic": ["n. 爱"]});
    registry.register_provider(StaticProvider::new("youdao", result.clone()));

    let response = dispatcher(registry).search("youdao", "love").await;

    assert_eq!(
        response.to_value(),
        json!({"result": result, "dict": "youdao"})
    );
}

#[tokio::test]
async fn test_rejected_search_passes_error_through() {
    let response = dispatcher(test_registry()).search("broken", "love").await;

    assert_eq!(
        response.to_value(),
        json!({
            "error": {"status": 500, "reason": "upstream down"},
            "dict": "broken"
        })
    );
}

#[tokio::test]
async fn test_panicking_provider_becomes_error_reply() {
    let mut registry = DictRegistry::new();
    registry.register_provider(Arc::new(PanickingProvider));

    let response = dispatcher(registry).search("boom", "love").await;

    assert!(response.is_error());
    assert_eq!(response.dict(), "boom");
    let value = response.to_value();
    assert_eq!(value["error"]["code"], "internal_error");
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("parser exploded"));
}

#[tokio::test]
async fn test_provider_sees_current_config() {
    let registry = test_registry().with_policy(ConfigSyncPolicy::ApplyIncoming);
    let registry = Arc::new(registry);
    let dispatcher = SearchDispatcher::new(Arc::clone(&registry));

    let mut custom = common::custom_config();
    custom.version = 42;
    registry.set_configs(&custom).await;

    let SearchResponse::Found { result, .. } = dispatcher.search("echo", "x").await else {
        panic!("echo provider should resolve");
    };
    assert_eq!(result["version"], 42);
    assert_eq!(result["active"], false);
}

#[tokio::test]
async fn test_concurrent_searches_keep_their_own_dict() {
    let dispatcher = dispatcher(test_registry());

    // `slow` starts first but settles last.
    let (slow, fast, missing) = tokio::join!(
        dispatcher.search("slow", "first"),
        dispatcher.search("fast", "second"),
        dispatcher.search("ghost", "third"),
    );

    assert_eq!(slow.dict(), "slow");
    assert_eq!(
        slow.to_value()["result"],
        json!({"echo": "first", "from": "slow"})
    );
    assert_eq!(fast.dict(), "fast");
    assert_eq!(
        fast.to_value()["result"],
        json!({"echo": "second", "from": "fast"})
    );
    assert_eq!(missing, SearchResponse::missing("ghost"));
}

#[tokio::test]
async fn test_spawned_searches_settle_out_of_order() {
    let dispatcher = dispatcher(test_registry());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    for (dict, text) in [("slow", "a"), ("fast", "b")] {
        let dispatcher = dispatcher.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = dispatcher.search(dict, text).await;
            let _ = tx.send((dict, response));
        });
    }
    drop(tx);

    let (first_dict, first) = rx.recv().await.unwrap();
    let (second_dict, second) = rx.recv().await.unwrap();
    assert_eq!(first_dict, "fast");
    assert_eq!(first.dict(), "fast");
    assert_eq!(second_dict, "slow");
    assert_eq!(second.dict(), "slow");
}
