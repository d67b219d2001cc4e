// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher lifecycle: initialize, start, stop, shutdown
//!
//! Transitions are serialized on a lock so concurrent start/stop calls see
//! consistent states. `stop` never cancels in-flight work: it waits for the
//! loop, for every blocking resolution, and for every tracked detached task.

use std::future::Future;

use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::EngineError;

/// Lifecycle states of a dispatcher.
///
/// `ShutDown` is terminal: a shut-down dispatcher cannot be re-initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningState {
    NotInitialized,
    Initialized,
    Running,
    Stopped,
    ShutDown,
}

impl Dispatcher {
    /// Current lifecycle state
    pub fn running_state(&self) -> RunningState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.running_state() == RunningState::Running
    }

    fn set_state(&self, next: RunningState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Initialize the dispatcher and its collaborators.
    ///
    /// Idempotent: collaborator `initialize` calls are repeated (they own
    /// their idempotence), everything else happens only on the first call.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        let _guard = self.transitions.lock().await;
        if self.running_state() == RunningState::ShutDown {
            return Err(EngineError::ShutDown);
        }

        self.client.initialize().await?;
        if let Some(jobs) = &self.jobs {
            jobs.initialize().await?;
        }

        if self.running_state() == RunningState::NotInitialized {
            if let Some(backend) = &self.persistence {
                self.store.load(backend.as_ref()).await?;
                debug!("state store loaded from persistence");
            }
            self.set_state(RunningState::Initialized);
            info!("dispatcher initialized");
        } else {
            debug!("dispatcher already initialized");
        }
        Ok(())
    }

    /// Start the dispatch loop (and the flush loop, when persistence is
    /// configured).
    ///
    /// The `Running` transition only happens after the loop signals
    /// readiness; a failed start leaves the dispatcher in its prior
    /// non-running state.
    pub async fn start(&self) -> Result<(), EngineError> {
        let _guard = self.transitions.lock().await;
        match self.running_state() {
            RunningState::NotInitialized => return Err(EngineError::NotInitialized),
            RunningState::Running => return Err(EngineError::AlreadyRunning),
            RunningState::ShutDown => return Err(EngineError::ShutDown),
            RunningState::Initialized | RunningState::Stopped => {}
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = oneshot::channel();

        let fetch = tokio::spawn(self.clone().run_fetch_loop(ready_tx, shutdown_rx.clone()));
        if ready_rx.await.is_err() {
            // The loop died before signaling readiness; stay non-running
            let _ = shutdown_tx.send(true);
            fetch.abort();
            return Err(EngineError::StartFailed);
        }

        let flush = self
            .persistence
            .is_some()
            .then(|| tokio::spawn(self.clone().run_flush_loop(shutdown_rx)));

        *self.shutdown_tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(shutdown_tx);
        *self.fetch_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(fetch);
        *self.flush_task.lock().unwrap_or_else(|e| e.into_inner()) = flush;

        self.set_state(RunningState::Running);
        info!("dispatcher started");
        Ok(())
    }

    /// Stop the dispatch loop after draining in-flight resolutions and all
    /// tracked detached tasks.
    ///
    /// Events still queued are not fetched anymore.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let _guard = self.transitions.lock().await;
        if self.running_state() != RunningState::Running {
            return Err(EngineError::NotRunning);
        }
        info!("dispatcher is stopping, this may take a moment");

        if let Some(tx) = self
            .shutdown_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            // Receivers may be gone already if the loop ended on its own
            let _ = tx.send(true);
        }

        let fetch = self.fetch_task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = fetch {
            if let Err(err) = handle.await {
                warn!("dispatch loop ended abnormally: {err}");
            }
        }

        debug!("waiting for in-flight resolutions and detached tasks");
        self.tasks.drain().await;

        let flush = self.flush_task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = flush {
            if let Err(err) = handle.await {
                warn!("flush loop ended abnormally: {err}");
            }
        }

        // Final persistence flush is the last step of stopping; failures go
        // to the error chain like any other caught failure
        if let Some(backend) = &self.persistence {
            if let Err(err) = self.store.flush(backend.as_ref()).await {
                self.dispatch_error(None, Box::new(err)).await;
            }
        }

        self.set_state(RunningState::Stopped);
        info!("dispatcher stopped");
        Ok(())
    }

    /// Release collaborator resources. Fails while running; otherwise
    /// idempotent.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let _guard = self.transitions.lock().await;
        if self.running_state() == RunningState::Running {
            return Err(EngineError::StillRunning);
        }

        self.client.shutdown().await?;
        if let Some(jobs) = &self.jobs {
            jobs.shutdown().await?;
        }

        if let Some(backend) = &self.persistence {
            debug!("updating and flushing persistence before shutdown");
            self.store.flush(backend.as_ref()).await?;
        }

        self.set_state(RunningState::ShutDown);
        info!("dispatcher shut down");
        Ok(())
    }

    /// Scoped acquisition: `initialize` on entry, `shutdown` on every exit
    /// path, including when the body fails.
    pub async fn scoped<T, F, Fut>(&self, body: F) -> Result<T, EngineError>
    where
        F: FnOnce(Dispatcher) -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        if let Err(err) = self.initialize().await {
            if let Err(shutdown_err) = self.shutdown().await {
                warn!("shutdown after failed initialize also failed: {shutdown_err}");
            }
            return Err(err);
        }

        let result = body(self.clone()).await;

        match self.shutdown().await {
            Ok(()) => result,
            Err(shutdown_err) => match result {
                Ok(_) => Err(shutdown_err),
                Err(body_err) => {
                    warn!("shutdown after scoped body error also failed: {shutdown_err}");
                    Err(body_err)
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
