//! State-store migration specs

use crate::prelude::*;

/// Seed conversation data through the public path: a handler writing via
/// its context.
async fn seed_conversation(dispatcher: &Dispatcher, id: i64, key: &str, value: serde_json::Value) {
    let key = key.to_string();
    let seeder = FnHandler::new(
        |_| Match::Accept,
        move |_, _, ctx| {
            let key = key.clone();
            let value = value.clone();
            async move {
                ctx.conversation_data().unwrap().insert(key, value);
                Ok(Flow::Continue)
            }
        },
    )
    .shared();

    dispatcher.add_handler(seeder.clone(), DEFAULT_GROUP);
    dispatcher
        .process_event(Event::new(json!("seed")).with_origin(id, id))
        .await;
    dispatcher.remove_handler(&seeder, DEFAULT_GROUP).unwrap();
}

#[tokio::test]
async fn migrate_moves_data_and_removes_the_old_entry() {
    let dispatcher = dispatcher();
    seed_conversation(&dispatcher, 1, "key", json!("test")).await;

    dispatcher
        .migrate_conversation_data(None, Some(1), Some(2))
        .unwrap();

    let view = dispatcher.conversation_data();
    assert!(!view.contains(1));
    assert_eq!(
        view.get(2).and_then(|r| r.get("key").cloned()),
        Some(json!("test"))
    );
}

#[tokio::test]
async fn migrate_overwrites_data_at_the_new_id() {
    let dispatcher = dispatcher();
    seed_conversation(&dispatcher, 1, "from-old", json!(1)).await;
    seed_conversation(&dispatcher, 2, "pre-existing", json!(2)).await;

    dispatcher
        .migrate_conversation_data(None, Some(1), Some(2))
        .unwrap();

    let record = dispatcher.conversation_data().get(2).unwrap();
    assert_eq!(record.get("from-old"), Some(&json!(1)));
    assert_eq!(record.get("pre-existing"), None);
}

#[tokio::test]
async fn migrate_by_event_uses_hints_with_origin_fallback() {
    let dispatcher = dispatcher();
    seed_conversation(&dispatcher, 10, "key", json!("kept")).await;

    let event = Event::new(json!(null))
        .with_origin(10, 77)
        .with_migration(None, Some(20));
    dispatcher
        .migrate_conversation_data(Some(&event), None, None)
        .unwrap();

    let view = dispatcher.conversation_data();
    assert!(!view.contains(10));
    assert_eq!(
        view.get(20).and_then(|r| r.get("key").cloned()),
        Some(json!("kept"))
    );
}

#[tokio::test]
async fn migrate_argument_validation_is_exhaustive() {
    let dispatcher = dispatcher();
    let event = Event::new(json!(null)).with_migration(Some(1), Some(2));

    // Both sources
    assert_eq!(
        dispatcher.migrate_conversation_data(Some(&event), Some(1), Some(2)),
        Err(MigrateError::MutuallyExclusive)
    );
    // Neither source
    assert_eq!(
        dispatcher.migrate_conversation_data(None, None, None),
        Err(MigrateError::MissingSource)
    );
    // Half a pair
    assert_eq!(
        dispatcher.migrate_conversation_data(None, Some(1), None),
        Err(MigrateError::IncompletePair)
    );
    // Event without hints
    let no_hints = Event::new(json!(null)).with_origin(1, 1);
    assert_eq!(
        dispatcher.migrate_conversation_data(Some(&no_hints), None, None),
        Err(MigrateError::InvalidEvent)
    );
}

#[tokio::test]
async fn migrate_error_messages_are_distinct() {
    assert!(MigrateError::MutuallyExclusive
        .to_string()
        .contains("mutually exclusive"));
    assert!(MigrateError::MissingSource.to_string().contains("must be passed"));
    assert!(MigrateError::InvalidEvent
        .to_string()
        .contains("invalid event for migration"));
    assert!(MigrateError::IncompletePair.to_string().contains("both"));
}

#[tokio::test]
async fn drop_removes_data_and_tolerates_absence() {
    let dispatcher = dispatcher();
    seed_conversation(&dispatcher, 3, "key", json!("going away")).await;

    dispatcher.drop_conversation_data(3);
    assert!(!dispatcher.conversation_data().contains(3));

    // Absent ids are fine
    dispatcher.drop_conversation_data(3);
    dispatcher.drop_peer_data(1234);
}
