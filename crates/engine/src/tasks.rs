// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of outstanding detached tasks
//!
//! Non-blocking handlers, non-blocking error handlers, and (under a
//! concurrent limit) whole event resolutions run as detached tasks. They are
//! never cancelled; `stop` drains them all, including tasks spawned while
//! the drain is already underway.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::warn;

/// Tracked set of detached tasks.
#[derive(Clone, Default)]
pub struct TaskSet {
    inner: Arc<Mutex<JoinSet<()>>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a tracked task. Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.spawn(future);
    }

    /// Number of tasks not yet reaped
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every tracked task, in rounds: tasks spawned by draining
    /// tasks land in a fresh set and are picked up by the next round.
    pub async fn drain(&self) {
        loop {
            let mut set = {
                let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *guard)
            };
            if set.is_empty() {
                break;
            }
            while let Some(result) = set.join_next().await {
                if let Err(err) = result {
                    // A handler task panicked; the loop itself survives
                    warn!("detached task ended abnormally: {err}");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
