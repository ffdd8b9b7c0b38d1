mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{test_registry, StaticProvider};
use glossa_core::dispatcher::SearchDispatcher;
use glossa_core::message::{Envelope, Sender, TabId, SEARCH_TEXT};
use glossa_core::router::{MessageHandler, MessageRouter, RelayError, RouterError, TabMessenger};
use glossa_core::DictRegistry;
use serde_json::{json, Value};

/// Answers every forwarded envelope with what it saw.
#[derive(Default)]
struct RecordingTabs {
    seen: Mutex<Vec<(TabId, Envelope)>>,
}

#[async_trait]
impl TabMessenger for RecordingTabs {
    async fn send_to_tab(&self, tab_id: TabId, envelope: Envelope) -> Result<Value, RelayError> {
        self.seen.lock().unwrap().push((tab_id, envelope.clone()));
        Ok(json!({ "tab": tab_id, "got": envelope.payload }))
    }
}

struct HangingTabs;

#[async_trait]
impl TabMessenger for HangingTabs {
    async fn send_to_tab(&self, _tab_id: TabId, _envelope: Envelope) -> Result<Value, RelayError> {
        std::future::pending().await
    }
}

struct ClosedTabs;

#[async_trait]
impl TabMessenger for ClosedTabs {
    async fn send_to_tab(&self, tab_id: TabId, _envelope: Envelope) -> Result<Value, RelayError> {
        Err(RelayError::TabClosed(tab_id))
    }
}

struct Pong;

#[async_trait]
impl MessageHandler for Pong {
    async fn handle(&self, payload: Value, sender: &Sender) -> Option<Value> {
        Some(json!({ "pong": payload, "tab": sender.tab_id }))
    }
}

fn search_router() -> MessageRouter {
    MessageRouter::with_search(SearchDispatcher::new(Arc::new(test_registry())))
}

#[tokio::test]
async fn test_search_text_is_dispatched() {
    let router = search_router();
    let reply = router
        .route(Envelope::search_text("fast", "love"), Sender::tab(1))
        .await;
    assert_eq!(
        reply,
        Some(json!({"result": {"echo": "love", "from": "fast"}, "dict": "fast"}))
    );
}

#[tokio::test]
async fn test_search_text_for_unknown_dict_reports_missing() {
    let router = search_router();
    let reply = router
        .route(Envelope::search_text("ghost", "love"), Sender::tab(1))
        .await;
    assert_eq!(
        reply,
        Some(json!({"error": "Missing Dictionary!", "dict": "ghost"}))
    );
}

#[tokio::test]
async fn test_unclaimed_kind_gets_no_reply() {
    let router = search_router();
    let reply = router
        .route(Envelope::new("OPEN_URL", json!({"url": "x"})), Sender::tab(1))
        .await;
    assert_eq!(reply, None);
}

#[tokio::test]
async fn test_malformed_search_payload_gets_no_reply() {
    let mut registry = DictRegistry::new();
    let provider = StaticProvider::new("fast", json!("hit"));
    registry.register_provider(provider.clone());
    let router = MessageRouter::with_search(SearchDispatcher::new(Arc::new(registry)));

    let reply = router
        .route(Envelope::new(SEARCH_TEXT, json!({"dict": "fast"})), Sender::tab(1))
        .await;
    assert_eq!(reply, None);
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_one_handler_per_kind() {
    let mut router = search_router();
    assert!(router.handles(SEARCH_TEXT));
    assert!(router.on("PING", Arc::new(Pong)).is_ok());
    assert!(matches!(
        router.on("PING", Arc::new(Pong)),
        Err(RouterError::HandlerExists(kind)) if kind == "PING"
    ));
    assert!(matches!(
        router.on(SEARCH_TEXT, Arc::new(Pong)),
        Err(RouterError::HandlerExists(_))
    ));
}

#[tokio::test]
async fn test_custom_handler_receives_sender() {
    let mut router = MessageRouter::new();
    router.on("PING", Arc::new(Pong)).unwrap();
    let reply = router
        .route(Envelope::new("PING", json!(3)), Sender::tab(12))
        .await;
    assert_eq!(reply, Some(json!({"pong": 3, "tab": 12})));
}

#[tokio::test]
async fn test_self_message_is_relayed_verbatim() {
    let tabs = Arc::new(RecordingTabs::default());
    let router = search_router().with_messenger(tabs.clone());

    let payloads = [
        json!(null),
        json!("text"),
        json!([1, 2, {"deep": [true]}]),
        json!({"dict": "fast", "text": "love"}),
    ];
    for payload in payloads {
        let envelope = Envelope::new("PANEL_STATE", payload.clone()).relayed();
        let reply = router.route(envelope.clone(), Sender::tab(5)).await;
        assert_eq!(reply, Some(json!({"tab": 5, "got": payload})));

        let seen = tabs.seen.lock().unwrap();
        let (tab_id, forwarded) = seen.last().unwrap();
        assert_eq!(*tab_id, 5);
        assert_eq!(*forwarded, envelope);
    }
}

#[tokio::test]
async fn test_self_tagged_search_is_relayed_not_dispatched() {
    let tabs = Arc::new(RecordingTabs::default());
    let router = search_router().with_messenger(tabs.clone());

    let envelope = Envelope::search_text("fast", "love").relayed();
    let reply = router.route(envelope, Sender::tab(2)).await.unwrap();

    assert_eq!(reply["tab"], 2);
    assert!(reply.get("result").is_none());
    assert_eq!(tabs.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_relay_without_tab_or_messenger_gets_no_reply() {
    let router = search_router();
    let envelope = Envelope::new("X", json!(1)).relayed();
    assert_eq!(router.route(envelope.clone(), Sender::tab(1)).await, None);

    let router = search_router().with_messenger(Arc::new(RecordingTabs::default()));
    assert_eq!(router.route(envelope, Sender::default()).await, None);
}

#[tokio::test]
async fn test_relay_failure_gets_no_reply() {
    let router = search_router().with_messenger(Arc::new(ClosedTabs));
    let envelope = Envelope::new("X", json!(1)).relayed();
    assert_eq!(router.route(envelope, Sender::tab(3)).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_relay_timeout_gives_up() {
    let router = search_router()
        .with_messenger(Arc::new(HangingTabs))
        .with_relay_timeout(Some(Duration::from_millis(250)));
    let envelope = Envelope::new("X", json!(1)).relayed();
    assert_eq!(router.route(envelope, Sender::tab(3)).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_relay_without_timeout_waits() {
    let router = search_router().with_messenger(Arc::new(HangingTabs));
    let envelope = Envelope::new("X", json!(1)).relayed();
    let waited = tokio::time::timeout(
        Duration::from_secs(3600),
        router.route(envelope, Sender::tab(3)),
    )
    .await;
    assert!(waited.is_err());
}
