//! Persistence round-trip specs
//!
//! Read-through at initialize, write-through on flush, periodic flush while
//! running.

use crate::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn persistent_dispatcher(backend: MemoryPersistence, flush_interval: Duration) -> Dispatcher {
    init_tracing();
    Dispatcher::new(
        DispatcherDeps {
            client: Arc::new(FakeClient::new()),
            jobs: None,
            persistence: Some(Arc::new(backend)),
            queue: EventQueue::new(),
        },
        DispatcherConfig {
            poll_timeout: Duration::from_millis(10),
            flush_interval,
            ..DispatcherConfig::default()
        },
    )
}

/// Handler that copies the event payload into conversation data
fn recording_handler() -> Arc<dyn EventHandler> {
    FnHandler::new(
        |_| Match::Accept,
        |event: Event, _, ctx| async move {
            if let Some(data) = ctx.conversation_data() {
                data.insert("last", event.payload.clone());
            }
            Ok(Flow::Continue)
        },
    )
    .shared()
}

#[tokio::test]
async fn initialize_loads_seeded_state() {
    let backend = MemoryPersistence::new();
    let mut record = courier_core::store::Record::new();
    record.insert("restored".to_string(), json!(true));
    backend.seed_conversation(1, record);

    let dispatcher = persistent_dispatcher(backend, Duration::from_secs(60));
    dispatcher.initialize().await.unwrap();

    assert_eq!(
        dispatcher
            .conversation_data()
            .get(1)
            .and_then(|r| r.get("restored").cloned()),
        Some(json!(true))
    );
}

#[tokio::test]
async fn stop_writes_accessed_state_back() {
    let backend = MemoryPersistence::new();
    let dispatcher = persistent_dispatcher(backend.clone(), Duration::from_secs(60));
    dispatcher.add_handler(recording_handler(), 0);

    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();
    dispatcher
        .queue()
        .push(Event::new(json!("persist me")).with_origin(5, 6))
        .unwrap();

    // Wait for the write to land before stopping
    tokio::time::timeout(Duration::from_secs(2), async {
        while !dispatcher.conversation_data().contains(5) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();

    dispatcher.stop().await.unwrap();

    assert_eq!(
        backend.conversation(5).and_then(|r| r.get("last").cloned()),
        Some(json!("persist me"))
    );
    assert!(backend.flush_count() >= 1);
}

#[tokio::test]
async fn the_flush_loop_persists_without_a_stop() {
    let backend = MemoryPersistence::new();
    let dispatcher = persistent_dispatcher(backend.clone(), Duration::from_millis(20));
    dispatcher.add_handler(recording_handler(), 0);

    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();
    dispatcher
        .queue()
        .push(Event::new(json!("periodic")).with_origin(9, 9))
        .unwrap();

    // The periodic flush picks the write up while still running
    tokio::time::timeout(Duration::from_secs(2), async {
        while backend.conversation(9).is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert!(dispatcher.is_running());

    dispatcher.stop().await.unwrap();
}

#[tokio::test]
async fn dropped_entries_are_dropped_from_the_backend() {
    let backend = MemoryPersistence::new();
    let mut record = courier_core::store::Record::new();
    record.insert("k".to_string(), json!(1));
    backend.seed_conversation(4, record);

    let dispatcher = persistent_dispatcher(backend.clone(), Duration::from_secs(60));
    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();

    dispatcher.drop_conversation_data(4);
    dispatcher.stop().await.unwrap();

    assert_eq!(backend.conversation(4), None);
    assert!(backend.calls().contains(&AdapterCall::DropConversation { id: 4 }));
}

#[tokio::test]
async fn shutdown_flushes_a_stopped_dispatcher() {
    let backend = MemoryPersistence::new();
    let dispatcher = persistent_dispatcher(backend.clone(), Duration::from_secs(60));
    dispatcher.add_handler(recording_handler(), 0);

    dispatcher.initialize().await.unwrap();
    dispatcher
        .process_event(Event::new(json!("direct")).with_origin(2, 2))
        .await;
    dispatcher.shutdown().await.unwrap();

    assert_eq!(
        backend.conversation(2).and_then(|r| r.get("last").cloned()),
        Some(json!("direct"))
    );
}
