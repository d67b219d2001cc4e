// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound events and their routing metadata
//!
//! The engine never interprets an event's payload; it only looks at the
//! origin identifiers (for state scoping) and the migration hints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The pair of identifiers an event may carry to scope stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOrigin {
    /// Identifier of the conversation the event belongs to
    pub conversation_id: i64,
    /// Identifier of the peer that produced the event
    pub sender_id: i64,
}

impl EventOrigin {
    pub fn new(conversation_id: i64, sender_id: i64) -> Self {
        Self {
            conversation_id,
            sender_id,
        }
    }
}

/// One unit of externally-sourced work.
///
/// The payload is opaque to the engine and is only inspected by handler
/// predicates and callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub payload: Value,
    pub origin: Option<EventOrigin>,
    /// Conversation id this event migrates state away from
    pub migrate_from: Option<i64>,
    /// Conversation id this event migrates state towards
    pub migrate_to: Option<i64>,
    pub received_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event with a generated id and no origin.
    pub fn new(payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
            origin: None,
            migrate_from: None,
            migrate_to: None,
            received_at: Utc::now(),
        }
    }

    /// Override the generated id (mainly useful in tests and replays)
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    pub fn with_origin(self, conversation_id: i64, sender_id: i64) -> Self {
        Self {
            origin: Some(EventOrigin::new(conversation_id, sender_id)),
            ..self
        }
    }

    /// Attach migration hints. Either side may be absent; an event with
    /// neither hint is not a valid migration trigger.
    pub fn with_migration(self, from: Option<i64>, to: Option<i64>) -> Self {
        Self {
            migrate_from: from,
            migrate_to: to,
            ..self
        }
    }

    pub fn origin(&self) -> Option<EventOrigin> {
        self.origin
    }

    pub fn has_migration_hints(&self) -> bool {
        self.migrate_from.is_some() || self.migrate_to.is_some()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
