// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers, handler groups, and the error-handler chain
//!
//! This module provides:
//! - `EventHandler` / `ErrorHandler` - the predicate/callback capability
//! - `FnHandler` / `FnErrorHandler` - closure-composed concrete handlers
//! - `HandlerRegistry` - ordered handler groups
//! - `ErrorChain` - ordered, deduplicated error handlers

mod chain;
mod handler;
mod registry;

pub use chain::ErrorChain;
pub use handler::{
    CallbackError, CallbackResult, ErrorHandler, EventHandler, Flow, FnErrorHandler, FnHandler,
    Match,
};
pub use registry::{HandlerBatch, HandlerRegistry, RegistryError, DEFAULT_GROUP};
