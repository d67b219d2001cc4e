// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unbounded event queue feeding the dispatch loop
//!
//! Producers clone the queue freely and push from anywhere; the dispatch
//! loop is the single consumer and only ever takes with a timeout so it can
//! observe a stop request between polls.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::event::Event;

/// Errors from queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("event queue is closed")]
    Closed,
}

/// Unbounded in-memory event queue.
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Event>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Event>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Enqueue an event for dispatch.
    pub fn push(&self, event: Event) -> Result<(), QueueError> {
        self.tx.send(event).map_err(|_| QueueError::Closed)
    }

    /// Take the next event, waiting at most `timeout`.
    ///
    /// Returns `None` when the timeout elapses with no event available.
    pub async fn take(&self, timeout: Duration) -> Option<Event> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(event) => event,
            Err(_) => None,
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventQueue {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
