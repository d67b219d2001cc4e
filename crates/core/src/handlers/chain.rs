// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered chain of error handlers
//!
//! Invocation order is registration order. Registering the same handler
//! twice is a no-op; identity is pointer identity, as in the handler
//! registry.

use std::sync::Arc;

use tracing::debug;

use super::handler::ErrorHandler;

/// Error handlers invoked when a handler callback fails.
#[derive(Default)]
pub struct ErrorChain {
    handlers: Vec<Arc<dyn ErrorHandler>>,
}

impl ErrorChain {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Append an error handler. Duplicate registrations are ignored.
    pub fn add(&mut self, handler: Arc<dyn ErrorHandler>) {
        if self
            .handlers
            .iter()
            .any(|registered| Arc::ptr_eq(registered, &handler))
        {
            debug!("error handler is already registered, ignoring");
            return;
        }
        self.handlers.push(handler);
    }

    /// Remove an error handler by identity. Absent handlers are a no-op.
    pub fn remove(&mut self, handler: &Arc<dyn ErrorHandler>) {
        self.handlers
            .retain(|registered| !Arc::ptr_eq(registered, handler));
    }

    /// Snapshot in registration order, for one failure's dispatch.
    pub fn snapshot(&self) -> Vec<Arc<dyn ErrorHandler>> {
        self.handlers.clone()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
