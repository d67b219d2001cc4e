//! Stop-drain specs
//!
//! `stop` waits for in-flight blocking resolutions and every tracked
//! detached task; it never cancels a handler.

use crate::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

#[tokio::test]
async fn stop_waits_for_detached_tasks_pending_on_an_external_signal() {
    let dispatcher = dispatcher();
    let blocking_hits = Arc::new(AtomicUsize::new(0));
    let detached_done = Arc::new(AtomicUsize::new(0));
    // Zero-permit semaphore as the external signal the tasks wait on
    let gate = Arc::new(Semaphore::new(0));

    let done_in_cb = detached_done.clone();
    let gate_in_cb = gate.clone();
    dispatcher.add_handler(
        FnHandler::new(
            |_| Match::Accept,
            move |_, _, _| {
                let done = done_in_cb.clone();
                let gate = gate_in_cb.clone();
                async move {
                    gate.acquire().await.unwrap().forget();
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(Flow::Continue)
                }
            },
        )
        .detached()
        .shared(),
        0,
    );
    // A blocking sibling in the next group keeps processing normally
    dispatcher.add_handler(counting_handler(blocking_hits.clone()), 1);

    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();

    dispatcher.queue().push(Event::new(json!(1))).unwrap();
    dispatcher.queue().push(Event::new(json!(2))).unwrap();

    // Blocking handlers of both events finish while the detached tasks
    // still await their signal
    wait_for_count(&blocking_hits, 2).await;
    assert_eq!(detached_done.load(Ordering::SeqCst), 0);

    // Stop cannot complete until the detached tasks are released
    let stopper = dispatcher.clone();
    let stop_task = tokio::spawn(async move { stopper.stop().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!stop_task.is_finished());

    gate.add_permits(2);
    stop_task.await.unwrap().unwrap();

    assert_eq!(detached_done.load(Ordering::SeqCst), 2);
    assert_eq!(dispatcher.running_state(), RunningState::Stopped);
}

#[tokio::test]
async fn stop_waits_for_an_in_flight_blocking_resolution() {
    let dispatcher = dispatcher_with(ConcurrencyLimit::Bounded(2));
    let finished = Arc::new(AtomicBool::new(false));
    let gate = Arc::new(Notify::new());

    let finished_in_cb = finished.clone();
    let gate_in_cb = gate.clone();
    dispatcher.add_handler(
        FnHandler::new(
            |_| Match::Accept,
            move |_, _, _| {
                let finished = finished_in_cb.clone();
                let gate = gate_in_cb.clone();
                async move {
                    gate.notified().await;
                    finished.store(true, Ordering::SeqCst);
                    Ok(Flow::Continue)
                }
            },
        )
        .shared(),
        0,
    );

    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();
    dispatcher.queue().push(Event::new(json!(null))).unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    let stopper = dispatcher.clone();
    let stop_task = tokio::spawn(async move { stopper.stop().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    // The resolution is still parked on the gate; stop is still waiting
    assert!(!stop_task.is_finished());
    assert!(!finished.load(Ordering::SeqCst));

    // notify_one stores a permit, so the wakeup cannot be lost
    gate.notify_one();
    stop_task.await.unwrap().unwrap();
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn queued_but_unfetched_events_are_not_processed_after_stop() {
    let dispatcher = dispatcher();
    let hits = Arc::new(AtomicUsize::new(0));
    dispatcher.add_handler(counting_handler(hits.clone()), 0);

    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();
    dispatcher.queue().push(Event::new(json!(1))).unwrap();
    wait_for_count(&hits, 1).await;
    dispatcher.stop().await.unwrap();

    // Pushed after the loop stopped fetching: stays in the queue
    dispatcher.queue().push(Event::new(json!(2))).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn detached_tasks_from_an_earlier_event_outlive_sequential_admission() {
    let dispatcher = dispatcher_with(ConcurrencyLimit::Sequential);
    let blocking_hits = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());

    let gate_in_cb = gate.clone();
    dispatcher.add_handler(
        FnHandler::new(
            |event| {
                if event.payload == json!("with-detached") {
                    Match::Accept
                } else {
                    Match::Skip
                }
            },
            move |_, _, _| {
                let gate = gate_in_cb.clone();
                async move {
                    gate.notified().await;
                    Ok(Flow::Continue)
                }
            },
        )
        .detached()
        .shared(),
        0,
    );
    dispatcher.add_handler(counting_handler(blocking_hits.clone()), 1);

    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();

    // Event 1 leaves a pending detached task; event 2 is still admitted
    dispatcher
        .queue()
        .push(Event::new(json!("with-detached")))
        .unwrap();
    dispatcher.queue().push(Event::new(json!("plain"))).unwrap();

    wait_for_count(&blocking_hits, 2).await;

    gate.notify_one();
    dispatcher.stop().await.unwrap();
}
