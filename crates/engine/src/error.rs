// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the dispatcher

use courier_core::adapters::{ClientError, JobError, PersistenceError};
use thiserror::Error;

/// Errors surfaced synchronously by dispatcher lifecycle and validation.
///
/// Handler-callback failures never appear here: the dispatch loop catches
/// them and routes them to the error chain.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("dispatcher is not initialized")]
    NotInitialized,
    #[error("dispatcher is already running")]
    AlreadyRunning,
    #[error("dispatcher is not running")]
    NotRunning,
    #[error("dispatcher is still running")]
    StillRunning,
    #[error("dispatcher has been shut down")]
    ShutDown,
    #[error("dispatch loop failed to start")]
    StartFailed,
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("job subsystem error: {0}")]
    Jobs(#[from] JobError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Validation failures of the state-migration arguments
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrateError {
    #[error("an event and an id pair are mutually exclusive")]
    MutuallyExclusive,
    #[error("an id pair or an event must be passed")]
    MissingSource,
    #[error("invalid event for migration: no migration hints and no origin")]
    InvalidEvent,
    #[error("old and new origin ids must both be provided")]
    IncompletePair,
}
