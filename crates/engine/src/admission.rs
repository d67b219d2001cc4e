// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded admission control over concurrently-resolving events

use std::sync::Arc;

use courier_core::limits::ConcurrencyLimit;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Gate the dispatch loop passes before resolving an event.
///
/// Sequential limits carry no semaphore: the loop awaits each resolution
/// inline, which is the strictest admission there is.
#[derive(Clone)]
pub struct Admission {
    limit: ConcurrencyLimit,
    semaphore: Option<Arc<Semaphore>>,
}

impl Admission {
    pub fn new(limit: ConcurrencyLimit) -> Self {
        let semaphore = limit
            .is_concurrent()
            .then(|| Arc::new(Semaphore::new(limit.effective())));
        Self { limit, semaphore }
    }

    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    /// Wait for a slot. Returns `None` for sequential limits, where the
    /// caller resolves inline instead of spawning.
    pub async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        let semaphore = self.semaphore.as_ref()?;
        // The semaphore lives as long as the admission and is never closed
        Arc::clone(semaphore).acquire_owned().await.ok()
    }

    /// Free slots right now; `None` in sequential mode
    pub fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
