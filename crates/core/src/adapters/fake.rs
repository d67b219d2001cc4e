// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake collaborator implementations for testing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::traits::*;
use crate::store::Record;

/// Recorded call to a collaborator method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    // Client calls
    ClientInitialize,
    ClientShutdown,
    Send { destination: i64 },

    // Job subsystem calls
    JobsInitialize,
    JobsShutdown,

    // Persistence calls
    LoadAll,
    UpdateConversation { id: i64 },
    UpdatePeer { id: i64 },
    UpdateGlobal,
    DropConversation { id: i64 },
    DropPeer { id: i64 },
    Flush,
}

#[derive(Default)]
struct ClientState {
    calls: Vec<AdapterCall>,
    sent: Vec<(i64, Value)>,
    // Configurable failure modes
    initialize_fails: bool,
    send_fails: bool,
}

/// Fake outbound client recording every call.
#[derive(Clone, Default)]
pub struct FakeClient {
    state: Arc<Mutex<ClientState>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` fail from now on
    pub fn fail_initialize(&self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).initialize_fails = true;
    }

    /// Make `send` fail from now on
    pub fn fail_send(&self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).send_fails = true;
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).calls.clone()
    }

    pub fn sent(&self) -> Vec<(i64, Value)> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).sent.clone()
    }
}

#[async_trait]
impl OutboundClient for FakeClient {
    async fn initialize(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::ClientInitialize);
        if state.initialize_fails {
            return Err(ClientError::NotConnected);
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::ClientShutdown);
        Ok(())
    }

    async fn send(&self, destination: i64, payload: &Value) -> Result<Value, ClientError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::Send { destination });
        if state.send_fails {
            return Err(ClientError::SendFailed {
                destination,
                reason: "configured to fail".to_string(),
            });
        }
        state.sent.push((destination, payload.clone()));
        Ok(Value::Null)
    }
}

/// Fake job subsystem recording lifecycle calls.
#[derive(Clone, Default)]
pub struct FakeJobs {
    calls: Arc<Mutex<Vec<AdapterCall>>>,
}

impl FakeJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl JobRunner for FakeJobs {
    async fn initialize(&self) -> Result<(), JobError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(AdapterCall::JobsInitialize);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), JobError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(AdapterCall::JobsShutdown);
        Ok(())
    }
}

#[derive(Default)]
struct PersistenceState {
    calls: Vec<AdapterCall>,
    conversations: HashMap<i64, Record>,
    peers: HashMap<i64, Record>,
    global: Record,
    flush_count: usize,
    update_fails: bool,
}

/// In-memory persistence backend, also used as the reference implementation
/// in tests.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<PersistenceState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed stored conversation data before the engine loads it
    pub fn seed_conversation(&self, id: i64, record: Record) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.conversations.insert(id, record);
    }

    /// Seed the stored global record
    pub fn seed_global(&self, record: Record) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).global = record;
    }

    /// Make every update fail from now on
    pub fn fail_updates(&self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).update_fails = true;
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).calls.clone()
    }

    pub fn conversation(&self, id: i64) -> Option<Record> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.conversations.get(&id).cloned()
    }

    pub fn peer(&self, id: i64) -> Option<Record> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.peers.get(&id).cloned()
    }

    pub fn global(&self) -> Record {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).global.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).flush_count
    }
}

#[async_trait]
impl PersistenceBackend for MemoryPersistence {
    async fn load_conversation_data(&self) -> Result<HashMap<i64, Record>, PersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::LoadAll);
        Ok(state.conversations.clone())
    }

    async fn load_peer_data(&self) -> Result<HashMap<i64, Record>, PersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.peers.clone())
    }

    async fn load_global_data(&self) -> Result<Record, PersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.global.clone())
    }

    async fn update_conversation_data(
        &self,
        id: i64,
        record: &Record,
    ) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::UpdateConversation { id });
        if state.update_fails {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        state.conversations.insert(id, record.clone());
        Ok(())
    }

    async fn update_peer_data(&self, id: i64, record: &Record) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::UpdatePeer { id });
        if state.update_fails {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        state.peers.insert(id, record.clone());
        Ok(())
    }

    async fn update_global_data(&self, record: &Record) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::UpdateGlobal);
        if state.update_fails {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        state.global = record.clone();
        Ok(())
    }

    async fn drop_conversation_data(&self, id: i64) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::DropConversation { id });
        state.conversations.remove(&id);
        Ok(())
    }

    async fn drop_peer_data(&self, id: i64) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::DropPeer { id });
        state.peers.remove(&id);
        Ok(())
    }

    async fn flush(&self) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(AdapterCall::Flush);
        state.flush_count += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
