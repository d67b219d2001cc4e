// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Origin-scoped key-value state store
//!
//! Three stores: conversation-scoped data, peer-scoped data, and one global
//! record. Public accessors return read-only views; mutation happens through
//! the scoped handles a `Context` carries, or through the engine's
//! migrate/drop operations. Accessed entries are tracked so a persistence
//! backend can be brought up to date on flush.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::adapters::{PersistenceBackend, PersistenceError};

/// The opaque per-origin (and global) record type
pub type Record = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Conversation,
    Peer,
}

#[derive(Default)]
struct Inner {
    conversations: HashMap<i64, Record>,
    peers: HashMap<i64, Record>,
    global: Record,
    // Origin ids accessed since the last flush, and ids dropped since then.
    dirty_conversations: HashSet<i64>,
    dirty_peers: HashSet<i64>,
    dropped_conversations: HashSet<i64>,
    dropped_peers: HashSet<i64>,
}

impl Inner {
    fn map(&self, scope: Scope) -> &HashMap<i64, Record> {
        match scope {
            Scope::Conversation => &self.conversations,
            Scope::Peer => &self.peers,
        }
    }

    /// Mark an id as accessed: it re-enters the dirty set and leaves the
    /// dropped set, then its record exists (created default when absent).
    fn touch(&mut self, scope: Scope, id: i64) -> &mut Record {
        match scope {
            Scope::Conversation => {
                self.dirty_conversations.insert(id);
                self.dropped_conversations.remove(&id);
                self.conversations.entry(id).or_default()
            }
            Scope::Peer => {
                self.dirty_peers.insert(id);
                self.dropped_peers.remove(&id);
                self.peers.entry(id).or_default()
            }
        }
    }

    fn drop_id(&mut self, scope: Scope, id: i64) {
        let (map, dirty, dropped) = match scope {
            Scope::Conversation => (
                &mut self.conversations,
                &mut self.dirty_conversations,
                &mut self.dropped_conversations,
            ),
            Scope::Peer => (&mut self.peers, &mut self.dirty_peers, &mut self.dropped_peers),
        };
        if map.remove(&id).is_some() || dirty.remove(&id) {
            dirty.remove(&id);
            dropped.insert(id);
        }
    }
}

/// Shared state store. Cloning shares the underlying maps.
pub struct StateStore {
    inner: Arc<RwLock<Inner>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Read-only view over conversation-scoped data
    pub fn conversation_data(&self) -> ScopedView {
        ScopedView {
            inner: Arc::clone(&self.inner),
            scope: Scope::Conversation,
        }
    }

    /// Read-only view over peer-scoped data
    pub fn peer_data(&self) -> ScopedView {
        ScopedView {
            inner: Arc::clone(&self.inner),
            scope: Scope::Peer,
        }
    }

    /// Read-only view over the global record
    pub fn global_data(&self) -> GlobalView {
        GlobalView {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn conversation_scope(&self, id: i64) -> ScopedData {
        ScopedData {
            inner: Arc::clone(&self.inner),
            scope: Scope::Conversation,
            id,
        }
    }

    pub fn peer_scope(&self, id: i64) -> ScopedData {
        ScopedData {
            inner: Arc::clone(&self.inner),
            scope: Scope::Peer,
            id,
        }
    }

    pub fn global_scope(&self) -> GlobalData {
        GlobalData {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Move all conversation data from `old_id` to `new_id`.
    ///
    /// The target entry is overwritten and the old entry is removed even if
    /// it was empty; an absent old entry moves as a default (empty) record.
    pub fn migrate_conversation(&self, old_id: i64, new_id: i64) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let record = inner.conversations.remove(&old_id).unwrap_or_default();
        inner.conversations.insert(new_id, record);

        inner.dirty_conversations.remove(&old_id);
        inner.dropped_conversations.insert(old_id);
        inner.dirty_conversations.insert(new_id);
        inner.dropped_conversations.remove(&new_id);
        debug!(old_id, new_id, "migrated conversation data");
    }

    /// Remove the conversation entry for `id`. No-op when absent.
    pub fn drop_conversation(&self, id: i64) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.drop_id(Scope::Conversation, id);
    }

    /// Remove the peer entry for `id`. No-op when absent.
    pub fn drop_peer(&self, id: i64) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.drop_id(Scope::Peer, id);
    }

    /// Replace all stores with the backend's contents (read-through at
    /// initialization).
    pub async fn load(&self, backend: &dyn PersistenceBackend) -> Result<(), PersistenceError> {
        let conversations = backend.load_conversation_data().await?;
        let peers = backend.load_peer_data().await?;
        let global = backend.load_global_data().await?;

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.conversations = conversations;
        inner.peers = peers;
        inner.global = global;
        inner.dirty_conversations.clear();
        inner.dirty_peers.clear();
        inner.dropped_conversations.clear();
        inner.dropped_peers.clear();
        Ok(())
    }

    /// Push entries accessed since the last flush (and recorded drops) to
    /// the backend, then ask the backend to flush itself. The global record
    /// is always written.
    pub async fn flush(&self, backend: &dyn PersistenceBackend) -> Result<(), PersistenceError> {
        let (conv_updates, peer_updates, conv_drops, peer_drops, global) = {
            let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

            let conv_updates: Vec<(i64, Record)> = inner
                .dirty_conversations
                .iter()
                .filter_map(|id| inner.conversations.get(id).map(|r| (*id, r.clone())))
                .collect();
            let peer_updates: Vec<(i64, Record)> = inner
                .dirty_peers
                .iter()
                .filter_map(|id| inner.peers.get(id).map(|r| (*id, r.clone())))
                .collect();
            let conv_drops: Vec<i64> = inner.dropped_conversations.iter().copied().collect();
            let peer_drops: Vec<i64> = inner.dropped_peers.iter().copied().collect();
            let global = inner.global.clone();

            inner.dirty_conversations.clear();
            inner.dirty_peers.clear();
            inner.dropped_conversations.clear();
            inner.dropped_peers.clear();

            (conv_updates, peer_updates, conv_drops, peer_drops, global)
        };

        for id in conv_drops {
            backend.drop_conversation_data(id).await?;
        }
        for id in peer_drops {
            backend.drop_peer_data(id).await?;
        }
        for (id, record) in conv_updates {
            backend.update_conversation_data(id, &record).await?;
        }
        for (id, record) in peer_updates {
            backend.update_peer_data(id, &record).await?;
        }
        backend.update_global_data(&global).await?;
        backend.flush().await
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only projection over one of the origin-scoped maps.
///
/// There are deliberately no mutating methods here: writes go through the
/// scoped handles on a `Context` or the engine's migrate/drop operations.
#[derive(Clone)]
pub struct ScopedView {
    inner: Arc<RwLock<Inner>>,
    scope: Scope,
}

impl ScopedView {
    pub fn get(&self, id: i64) -> Option<Record> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.map(self.scope).get(&id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.map(self.scope).contains_key(&id)
    }

    /// Origin ids currently present, ascending
    pub fn ids(&self) -> Vec<i64> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<i64> = inner.map(self.scope).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.map(self.scope).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only projection over the global record.
#[derive(Clone)]
pub struct GlobalView {
    inner: Arc<RwLock<Inner>>,
}

impl GlobalView {
    pub fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.global.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.global.contains_key(key)
    }

    pub fn snapshot(&self) -> Record {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.global.clone()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutable handle over one origin's record, handed out via the `Context`.
///
/// Every access creates the record if absent and marks it for the next
/// persistence flush (reads included, since read entries must reach the
/// backend too).
#[derive(Clone)]
pub struct ScopedData {
    inner: Arc<RwLock<Inner>>,
    scope: Scope,
    id: i64,
}

impl ScopedData {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.touch(self.scope, self.id).get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.touch(self.scope, self.id).insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.touch(self.scope, self.id).remove(key)
    }

    pub fn snapshot(&self) -> Record {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.touch(self.scope, self.id).clone()
    }
}

/// Mutable handle over the global record.
#[derive(Clone)]
pub struct GlobalData {
    inner: Arc<RwLock<Inner>>,
}

impl GlobalData {
    pub fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.global.get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.global.insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.global.remove(key)
    }

    pub fn snapshot(&self) -> Record {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.global.clone()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
