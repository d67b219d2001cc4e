// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-event context handed to handler callbacks
//!
//! A context is created fresh for each event and bundles the shared
//! collaborator handles, the state-store handles scoped to the event's
//! origin, and the error slot populated when a handler fails.

use std::sync::Arc;

use crate::adapters::{JobRunner, OutboundClient};
use crate::event::Event;
use crate::queue::EventQueue;
use crate::store::{GlobalData, ScopedData, StateStore};

/// Shared error value recorded on the context when a handler fails
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Per-event bundle of shared references and the error slot.
#[derive(Clone)]
pub struct Context {
    client: Arc<dyn OutboundClient>,
    jobs: Option<Arc<dyn JobRunner>>,
    queue: EventQueue,
    conversation: Option<ScopedData>,
    peer: Option<ScopedData>,
    global: GlobalData,
    error: Option<SharedError>,
}

impl Context {
    /// Outbound client for acting on the external system
    pub fn client(&self) -> &Arc<dyn OutboundClient> {
        &self.client
    }

    /// Scheduled-job subsystem, when configured
    pub fn jobs(&self) -> Option<&Arc<dyn JobRunner>> {
        self.jobs.as_ref()
    }

    /// Event queue handle, usable to inject follow-up events
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Conversation-scoped data; absent when the event has no origin
    pub fn conversation_data(&self) -> Option<&ScopedData> {
        self.conversation.as_ref()
    }

    /// Peer-scoped data; absent when the event has no origin
    pub fn peer_data(&self) -> Option<&ScopedData> {
        self.peer.as_ref()
    }

    /// Global data shared across all events
    pub fn global_data(&self) -> &GlobalData {
        &self.global
    }

    /// The failure that routed this context into the error chain, if any
    pub fn error(&self) -> Option<&SharedError> {
        self.error.as_ref()
    }

    /// Copy of this context with the error slot populated
    pub fn with_error(&self, error: SharedError) -> Self {
        Self {
            error: Some(error),
            ..self.clone()
        }
    }
}

/// Builds contexts for the dispatch loop and the error chain.
#[derive(Clone)]
pub struct ContextFactory {
    client: Arc<dyn OutboundClient>,
    jobs: Option<Arc<dyn JobRunner>>,
    queue: EventQueue,
    store: StateStore,
}

impl ContextFactory {
    pub fn new(
        client: Arc<dyn OutboundClient>,
        jobs: Option<Arc<dyn JobRunner>>,
        queue: EventQueue,
        store: StateStore,
    ) -> Self {
        Self {
            client,
            jobs,
            queue,
            store,
        }
    }

    /// Context for one event's resolution, scoped to its origin when present.
    pub fn context_for(&self, event: &Event) -> Context {
        let (conversation, peer) = match event.origin() {
            Some(origin) => (
                Some(self.store.conversation_scope(origin.conversation_id)),
                Some(self.store.peer_scope(origin.sender_id)),
            ),
            None => (None, None),
        };

        Context {
            client: Arc::clone(&self.client),
            jobs: self.jobs.clone(),
            queue: self.queue.clone(),
            conversation,
            peer,
            global: self.store.global_scope(),
            error: None,
        }
    }

    /// Context for the error chain: same scoping rules, error slot set.
    pub fn error_context(&self, event: Option<&Event>, error: SharedError) -> Context {
        let base = match event {
            Some(event) => self.context_for(event),
            None => Context {
                client: Arc::clone(&self.client),
                jobs: self.jobs.clone(),
                queue: self.queue.clone(),
                conversation: None,
                peer: None,
                global: self.store.global_scope(),
                error: None,
            },
        };
        base.with_error(error)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
