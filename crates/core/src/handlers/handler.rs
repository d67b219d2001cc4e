// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler abstraction: predicate, callback, blocking flag
//!
//! A handler is two operations — `check` decides whether the handler wants
//! an event (and may retain a payload for the callback), `handle` acts on
//! it. Concrete handlers are composed from plain closures via [`FnHandler`];
//! no trait hierarchy beyond the two operations.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Context;
use crate::event::Event;

/// Error type raised by handler and error-handler callbacks.
///
/// Opaque to the engine: it is recorded on the context's error slot and
/// routed to the error chain, never interpreted.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// What a callback asks the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep resolving later groups for this event
    Continue,
    /// Stop propagation: skip all remaining groups for this event.
    /// Only honored from a blocking callback.
    Stop,
}

/// Result of a handler callback
pub type CallbackResult = Result<Flow, CallbackError>;

/// Tri-state predicate result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// The handler does not want this event
    Skip,
    /// The handler wants this event
    Accept,
    /// The handler wants this event and retains a payload the callback
    /// can branch on
    AcceptWith(Value),
}

impl Match {
    pub fn is_match(&self) -> bool {
        !matches!(self, Match::Skip)
    }
}

/// A unit that may act on an event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Decide whether this handler wants `event`. Must not mutate state.
    fn check(&self, event: &Event) -> Match;

    /// Act on `event`. `check` is the retained predicate result.
    async fn handle(&self, event: &Event, check: Match, ctx: &Context) -> CallbackResult;

    /// Blocking handlers are awaited inline during resolution; non-blocking
    /// ones run as detached tasks the engine tracks until stop.
    fn blocking(&self) -> bool {
        true
    }
}

/// A unit invoked when a handler callback fails.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// `event` is the event whose handling failed, when there was one; the
    /// context's error slot holds the failure.
    async fn handle(&self, event: Option<&Event>, ctx: &Context) -> CallbackResult;

    fn blocking(&self) -> bool {
        true
    }
}

type BoxedCallback =
    Box<dyn Fn(Event, Match, Context) -> Pin<Box<dyn Future<Output = CallbackResult> + Send>> + Send + Sync>;

/// Handler composed from a predicate closure and an async callback closure.
pub struct FnHandler {
    predicate: Box<dyn Fn(&Event) -> Match + Send + Sync>,
    callback: BoxedCallback,
    blocking: bool,
}

impl FnHandler {
    pub fn new<P, C, F>(predicate: P, callback: C) -> Self
    where
        P: Fn(&Event) -> Match + Send + Sync + 'static,
        C: Fn(Event, Match, Context) -> F + Send + Sync + 'static,
        F: Future<Output = CallbackResult> + Send + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            callback: Box::new(move |event, check, ctx| Box::pin(callback(event, check, ctx))),
            blocking: true,
        }
    }

    /// Mark this handler non-blocking: its callback runs as a detached task.
    pub fn detached(mut self) -> Self {
        self.blocking = false;
        self
    }

    /// Convenience: wrap into the `Arc` form the registry stores.
    pub fn shared(self) -> Arc<dyn EventHandler> {
        Arc::new(self)
    }
}

#[async_trait]
impl EventHandler for FnHandler {
    fn check(&self, event: &Event) -> Match {
        (self.predicate)(event)
    }

    async fn handle(&self, event: &Event, check: Match, ctx: &Context) -> CallbackResult {
        (self.callback)(event.clone(), check, ctx.clone()).await
    }

    fn blocking(&self) -> bool {
        self.blocking
    }
}

type BoxedErrorCallback =
    Box<dyn Fn(Option<Event>, Context) -> Pin<Box<dyn Future<Output = CallbackResult> + Send>> + Send + Sync>;

/// Error handler composed from an async callback closure.
pub struct FnErrorHandler {
    callback: BoxedErrorCallback,
    blocking: bool,
}

impl FnErrorHandler {
    pub fn new<C, F>(callback: C) -> Self
    where
        C: Fn(Option<Event>, Context) -> F + Send + Sync + 'static,
        F: Future<Output = CallbackResult> + Send + 'static,
    {
        Self {
            callback: Box::new(move |event, ctx| Box::pin(callback(event, ctx))),
            blocking: true,
        }
    }

    pub fn detached(mut self) -> Self {
        self.blocking = false;
        self
    }

    pub fn shared(self) -> Arc<dyn ErrorHandler> {
        Arc::new(self)
    }
}

#[async_trait]
impl ErrorHandler for FnErrorHandler {
    async fn handle(&self, event: Option<&Event>, ctx: &Context) -> CallbackResult {
        (self.callback)(event.cloned(), ctx.clone()).await
    }

    fn blocking(&self) -> bool {
        self.blocking
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
