// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher: wiring, registration surface, and state-store operations
//!
//! The dispatch loop itself lives in `dispatch.rs`; lifecycle transitions in
//! `lifecycle.rs`.

use std::sync::{Arc, Mutex, RwLock};

use courier_core::adapters::{JobRunner, OutboundClient, PersistenceBackend};
use courier_core::context::ContextFactory;
use courier_core::event::Event;
use courier_core::handlers::{
    ErrorChain, ErrorHandler, EventHandler, HandlerBatch, HandlerRegistry, RegistryError,
};
use courier_core::limits::ConcurrencyLimit;
use courier_core::queue::EventQueue;
use courier_core::store::{GlobalView, ScopedView, StateStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::admission::Admission;
use crate::config::DispatcherConfig;
use crate::error::MigrateError;
use crate::lifecycle::RunningState;
use crate::tasks::TaskSet;

/// Collaborator dependencies handed to [`Dispatcher::new`].
pub struct DispatcherDeps {
    pub client: Arc<dyn OutboundClient>,
    pub jobs: Option<Arc<dyn JobRunner>>,
    pub persistence: Option<Arc<dyn PersistenceBackend>>,
    pub queue: EventQueue,
}

/// Asynchronous event-dispatch engine.
///
/// Cloning is cheap and shares all state; a clone is what the spawned loops
/// capture.
#[derive(Clone)]
pub struct Dispatcher {
    pub(crate) client: Arc<dyn OutboundClient>,
    pub(crate) jobs: Option<Arc<dyn JobRunner>>,
    pub(crate) persistence: Option<Arc<dyn PersistenceBackend>>,
    pub(crate) queue: EventQueue,
    pub(crate) store: StateStore,
    pub(crate) factory: ContextFactory,
    pub(crate) registry: Arc<RwLock<HandlerRegistry>>,
    pub(crate) error_chain: Arc<RwLock<ErrorChain>>,
    pub(crate) admission: Admission,
    pub(crate) config: Arc<DispatcherConfig>,
    pub(crate) state: Arc<Mutex<RunningState>>,
    /// Serializes lifecycle transitions under concurrent start/stop calls
    pub(crate) transitions: Arc<tokio::sync::Mutex<()>>,
    pub(crate) shutdown_tx: Arc<Mutex<Option<watch::Sender<bool>>>>,
    pub(crate) fetch_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub(crate) flush_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub(crate) tasks: TaskSet,
}

impl Dispatcher {
    pub fn new(deps: DispatcherDeps, config: DispatcherConfig) -> Self {
        let store = StateStore::new();
        let factory = ContextFactory::new(
            Arc::clone(&deps.client),
            deps.jobs.clone(),
            deps.queue.clone(),
            store.clone(),
        );
        let admission = Admission::new(config.concurrency);

        Self {
            client: deps.client,
            jobs: deps.jobs,
            persistence: deps.persistence,
            queue: deps.queue,
            store,
            factory,
            registry: Arc::new(RwLock::new(HandlerRegistry::new())),
            error_chain: Arc::new(RwLock::new(ErrorChain::new())),
            admission,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(RunningState::NotInitialized)),
            transitions: Arc::new(tokio::sync::Mutex::new(())),
            shutdown_tx: Arc::new(Mutex::new(None)),
            fetch_task: Arc::new(Mutex::new(None)),
            flush_task: Arc::new(Mutex::new(None)),
            tasks: TaskSet::new(),
        }
    }

    /// Effective concurrency limit
    pub fn concurrency(&self) -> ConcurrencyLimit {
        self.admission.limit()
    }

    /// Handle for pushing events into the dispatch queue
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Read-only view over conversation-scoped state
    pub fn conversation_data(&self) -> ScopedView {
        self.store.conversation_data()
    }

    /// Read-only view over peer-scoped state
    pub fn peer_data(&self) -> ScopedView {
        self.store.peer_data()
    }

    /// Read-only view over global state
    pub fn global_data(&self) -> GlobalView {
        self.store.global_data()
    }

    // =========================================================================
    // Handler registration
    // =========================================================================

    /// Register a handler in `group`. Groups resolve in ascending order;
    /// within a group the first predicate match wins.
    pub fn add_handler(&self, handler: Arc<dyn EventHandler>, group: i32) {
        self.registry
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .add(handler, group);
    }

    /// Register a batch of handlers; see [`HandlerBatch`].
    pub fn add_handlers(
        &self,
        batch: impl Into<HandlerBatch>,
        group: Option<i32>,
    ) -> Result<(), RegistryError> {
        self.registry
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .add_many(batch, group)
    }

    /// Remove a handler from `group` by identity.
    pub fn remove_handler(
        &self,
        handler: &Arc<dyn EventHandler>,
        group: i32,
    ) -> Result<(), RegistryError> {
        self.registry
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(handler, group)
    }

    /// Register an error handler; duplicate registrations are ignored.
    pub fn add_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        self.error_chain
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .add(handler);
    }

    /// Remove an error handler by identity.
    pub fn remove_error_handler(&self, handler: &Arc<dyn ErrorHandler>) {
        self.error_chain
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(handler);
    }

    // =========================================================================
    // State-store operations
    // =========================================================================

    /// Move conversation data between origin ids.
    ///
    /// Exactly one source must be supplied: either an event carrying
    /// migration hints, or the explicit `(old_id, new_id)` pair. Data under
    /// the old id overwrites the new id's entry; the old entry is removed.
    pub fn migrate_conversation_data(
        &self,
        event: Option<&Event>,
        old_id: Option<i64>,
        new_id: Option<i64>,
    ) -> Result<(), MigrateError> {
        if event.is_some() && (old_id.is_some() || new_id.is_some()) {
            return Err(MigrateError::MutuallyExclusive);
        }

        let (old_id, new_id) = match event {
            Some(event) => {
                if !event.has_migration_hints() {
                    return Err(MigrateError::InvalidEvent);
                }
                let origin = event.origin().map(|o| o.conversation_id);
                let old = event
                    .migrate_from
                    .or(origin)
                    .ok_or(MigrateError::InvalidEvent)?;
                let new = event
                    .migrate_to
                    .or(origin)
                    .ok_or(MigrateError::InvalidEvent)?;
                (old, new)
            }
            None => match (old_id, new_id) {
                (None, None) => return Err(MigrateError::MissingSource),
                (Some(old), Some(new)) => (old, new),
                _ => return Err(MigrateError::IncompletePair),
            },
        };

        self.store.migrate_conversation(old_id, new_id);
        Ok(())
    }

    /// Delete the conversation entry for `id`, even if it is not empty.
    /// No-op when absent.
    pub fn drop_conversation_data(&self, id: i64) {
        self.store.drop_conversation(id);
    }

    /// Delete the peer entry for `id`, even if it is not empty. No-op when
    /// absent.
    pub fn drop_peer_data(&self, id: i64) {
        self.store.drop_peer(id);
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
