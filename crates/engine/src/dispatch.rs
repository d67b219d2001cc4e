// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event resolution and the dispatch loop
//!
//! Resolution walks the handler groups in ascending order; the first
//! predicate match wins each group. A blocking handler's `Flow::Stop`
//! aborts the remaining groups. Callback failures are routed to the error
//! chain and never escape the loop.

use std::sync::Arc;

use courier_core::context::{Context, SharedError};
use courier_core::event::Event;
use courier_core::handlers::{CallbackError, EventHandler, Flow, Match};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, warn};

use crate::dispatcher::Dispatcher;

impl Dispatcher {
    /// Resolve a single event outside the queue-driven loop.
    ///
    /// Same rules as loop-driven dispatch; no admission gate. Failures are
    /// consumed by the error chain, so this never returns an error.
    pub async fn process_event(&self, event: Event) {
        let groups = self
            .registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot();
        // Built lazily: events nobody matches never pay for a context
        let mut context: Option<Context> = None;

        'groups: for (group, handlers) in groups {
            for handler in handlers {
                let check = handler.check(&event);
                if !check.is_match() {
                    continue;
                }

                let ctx = context
                    .get_or_insert_with(|| self.factory.context_for(&event))
                    .clone();

                if handler.blocking() {
                    match handler.handle(&event, check, &ctx).await {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Stop) => {
                            debug!(event = %event.id, group, "handler stopped propagation");
                            break 'groups;
                        }
                        Err(failure) => {
                            if self.dispatch_error(Some(&event), failure).await {
                                debug!(event = %event.id, "error handler stopped further handlers");
                                break 'groups;
                            }
                        }
                    }
                } else {
                    self.spawn_detached_handler(handler, &event, check, ctx);
                }

                // First match wins within this group
                continue 'groups;
            }
        }
    }

    fn spawn_detached_handler(
        &self,
        handler: Arc<dyn EventHandler>,
        event: &Event,
        check: Match,
        ctx: Context,
    ) {
        if !self.is_running() {
            warn!(
                event = %event.id,
                "detached handler spawned while the dispatcher is not running; \
                 it is only awaited once the dispatcher runs and stops again"
            );
        }
        let this = self.clone();
        let event = event.clone();
        self.tasks.spawn(async move {
            match handler.handle(&event, check, &ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => warn!(
                    event = %event.id,
                    "stop propagation is not supported from a non-blocking handler"
                ),
                Err(failure) => {
                    this.dispatch_error(Some(&event), failure).await;
                }
            }
        });
    }

    /// Route a callback failure through the error chain.
    ///
    /// Returns `true` when a blocking error handler raised `Flow::Stop`, in
    /// which case the caller aborts the event's remaining groups.
    pub(crate) async fn dispatch_error(&self, event: Option<&Event>, failure: CallbackError) -> bool {
        let chain = self
            .error_chain
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot();
        let shared: SharedError = Arc::from(failure);

        if chain.is_empty() {
            warn!("no error handlers are registered, swallowing: {shared}");
            return false;
        }

        let ctx = self.factory.error_context(event, Arc::clone(&shared));
        for handler in chain {
            if handler.blocking() {
                match handler.handle(event, &ctx).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Stop) => return true,
                    Err(err) => {
                        error!("an error was raised while handling an error: {err}");
                    }
                }
            } else {
                let owned_event = event.cloned();
                let ctx = ctx.clone();
                self.tasks.spawn(async move {
                    match handler.handle(owned_event.as_ref(), &ctx).await {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Stop) => warn!(
                            "stop propagation is not supported from a non-blocking error handler"
                        ),
                        Err(err) => {
                            error!("an error was raised while handling an error: {err}");
                        }
                    }
                });
            }
        }
        false
    }

    /// The queue-draining loop. Runs until the shutdown flag flips; the
    /// short queue-poll timeout is what lets it observe a stop request
    /// promptly.
    pub(crate) async fn run_fetch_loop(
        self,
        ready: oneshot::Sender<()>,
        shutdown: watch::Receiver<bool>,
    ) {
        let _ = ready.send(());
        debug!("dispatch loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            let Some(event) = self.queue.take(self.config.poll_timeout).await else {
                continue;
            };
            debug!(event = %event.id, "processing event");

            // Admission happens here, before the spawn, so events begin
            // resolution in dequeue order even under a concurrent limit.
            match self.admission.admit().await {
                Some(permit) => {
                    let this = self.clone();
                    self.tasks.spawn(async move {
                        this.process_event(event).await;
                        drop(permit);
                    });
                }
                None => self.process_event(event).await,
            }
        }

        debug!("dispatch loop stopped");
    }

    /// Periodic persistence flush, running alongside the fetch loop.
    pub(crate) async fn run_flush_loop(self, mut shutdown: watch::Receiver<bool>) {
        let Some(backend) = self.persistence.clone() else {
            return;
        };

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.config.flush_interval) => {
                    if let Err(err) = self.store.flush(backend.as_ref()).await {
                        warn!("periodic persistence flush failed: {err}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
