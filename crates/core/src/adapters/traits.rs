// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator trait definitions for external integrations
//!
//! The engine only drives these at their lifecycle boundary: collaborator
//! `initialize` during engine initialize, collaborator `shutdown` during
//! engine shutdown. Everything else is invoked by handler callbacks.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::store::Record;

// =============================================================================
// Outbound client
// =============================================================================

/// Errors from outbound client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client is not connected")]
    NotConnected,
    #[error("send to {destination} failed: {reason}")]
    SendFailed { destination: i64, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client used by handler callbacks to act on the external system.
#[async_trait]
pub trait OutboundClient: Send + Sync {
    async fn initialize(&self) -> Result<(), ClientError>;

    async fn shutdown(&self) -> Result<(), ClientError>;

    /// Send a payload to a destination on the external system.
    async fn send(&self, destination: i64, payload: &Value) -> Result<Value, ClientError>;
}

// =============================================================================
// Job subsystem
// =============================================================================

/// Errors from the scheduled-job subsystem
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job subsystem failure: {0}")]
    Failed(String),
}

/// Handle to the scheduled-job subsystem, exposed to callbacks via the
/// context. The engine only drives its lifecycle.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn initialize(&self) -> Result<(), JobError>;

    async fn shutdown(&self) -> Result<(), JobError>;
}

// =============================================================================
// Persistence backend
// =============================================================================

/// Errors from the durable-persistence backend
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Optional durable backend for the state store.
///
/// Loaded once during engine initialization; afterwards it receives the
/// entries accessed since the previous flush, keyed by origin id, plus the
/// global record.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn load_conversation_data(&self) -> Result<HashMap<i64, Record>, PersistenceError>;

    async fn load_peer_data(&self) -> Result<HashMap<i64, Record>, PersistenceError>;

    async fn load_global_data(&self) -> Result<Record, PersistenceError>;

    async fn update_conversation_data(&self, id: i64, record: &Record)
        -> Result<(), PersistenceError>;

    async fn update_peer_data(&self, id: i64, record: &Record) -> Result<(), PersistenceError>;

    async fn update_global_data(&self, record: &Record) -> Result<(), PersistenceError>;

    async fn drop_conversation_data(&self, id: i64) -> Result<(), PersistenceError>;

    async fn drop_peer_data(&self, id: i64) -> Result<(), PersistenceError>;

    /// Make everything handed over so far durable.
    async fn flush(&self) -> Result<(), PersistenceError>;
}
