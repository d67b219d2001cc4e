//! Lifecycle transition specs
//!
//! Verify the initialize -> start -> stop -> shutdown sequences and their
//! error cases through the public API.

use crate::prelude::*;

#[tokio::test]
async fn full_lifecycle_happy_path() {
    let dispatcher = dispatcher();
    assert_eq!(dispatcher.running_state(), RunningState::NotInitialized);

    dispatcher.initialize().await.unwrap();
    assert_eq!(dispatcher.running_state(), RunningState::Initialized);

    dispatcher.start().await.unwrap();
    assert_eq!(dispatcher.running_state(), RunningState::Running);
    assert!(dispatcher.is_running());

    dispatcher.stop().await.unwrap();
    assert_eq!(dispatcher.running_state(), RunningState::Stopped);

    dispatcher.shutdown().await.unwrap();
    assert_eq!(dispatcher.running_state(), RunningState::ShutDown);
}

#[tokio::test]
async fn start_before_initialize_fails_not_initialized() {
    let dispatcher = dispatcher();
    assert!(matches!(
        dispatcher.start().await,
        Err(EngineError::NotInitialized)
    ));
}

#[tokio::test]
async fn start_twice_fails_already_running() {
    let dispatcher = dispatcher();
    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();

    assert!(matches!(
        dispatcher.start().await,
        Err(EngineError::AlreadyRunning)
    ));
    dispatcher.stop().await.unwrap();
}

#[tokio::test]
async fn stop_before_any_start_fails_not_running() {
    let dispatcher = dispatcher();
    assert!(matches!(dispatcher.stop().await, Err(EngineError::NotRunning)));

    dispatcher.initialize().await.unwrap();
    assert!(matches!(dispatcher.stop().await, Err(EngineError::NotRunning)));
}

#[tokio::test]
async fn stop_then_stop_again_fails_not_running() {
    let dispatcher = dispatcher();
    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();
    dispatcher.stop().await.unwrap();

    assert!(matches!(dispatcher.stop().await, Err(EngineError::NotRunning)));
}

#[tokio::test]
async fn restart_after_stop_is_allowed() {
    let dispatcher = dispatcher();
    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();
    dispatcher.stop().await.unwrap();

    dispatcher.start().await.unwrap();
    assert!(dispatcher.is_running());
    dispatcher.stop().await.unwrap();
}

#[tokio::test]
async fn concurrent_start_calls_admit_exactly_one() {
    let dispatcher = dispatcher();
    dispatcher.initialize().await.unwrap();

    let a = dispatcher.clone();
    let b = dispatcher.clone();
    let (ra, rb) = tokio::join!(a.start(), b.start());

    // One wins, the other observes the running state
    assert!(ra.is_ok() != rb.is_ok());
    assert!(dispatcher.is_running());
    dispatcher.stop().await.unwrap();
}

#[tokio::test]
async fn concurrent_stop_calls_admit_exactly_one() {
    let dispatcher = dispatcher();
    dispatcher.initialize().await.unwrap();
    dispatcher.start().await.unwrap();

    let a = dispatcher.clone();
    let b = dispatcher.clone();
    let (ra, rb) = tokio::join!(a.stop(), b.stop());

    assert!(ra.is_ok() != rb.is_ok());
    assert_eq!(dispatcher.running_state(), RunningState::Stopped);
}

#[tokio::test]
async fn scoped_acquisition_brackets_the_body() {
    let dispatcher = dispatcher();

    let result = dispatcher
        .scoped(|d| async move {
            assert_eq!(d.running_state(), RunningState::Initialized);
            Ok("done")
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(dispatcher.running_state(), RunningState::ShutDown);
}

#[tokio::test]
async fn scoped_acquisition_shuts_down_on_body_failure() {
    let dispatcher = dispatcher();

    let result: Result<(), EngineError> = dispatcher
        .scoped(|_| async move { Err(EngineError::NotRunning) })
        .await;

    assert!(result.is_err());
    assert_eq!(dispatcher.running_state(), RunningState::ShutDown);
}
