//! courier-core: Core library for the courier event-dispatch engine
//!
//! This crate provides:
//! - The opaque `Event` model and the unbounded `EventQueue`
//! - The handler abstraction, handler groups, and the error-handler chain
//! - The origin-scoped `StateStore` with read-only public views
//! - The per-event `Context` and its factory
//! - Collaborator traits (client, jobs, persistence) and test fakes
//! - The `ConcurrencyLimit` admission policy type

pub mod adapters;
pub mod context;
pub mod event;
pub mod handlers;
pub mod limits;
pub mod queue;
pub mod store;

// Re-exports
pub use context::{Context, ContextFactory, SharedError};
pub use event::{Event, EventOrigin};
pub use handlers::{
    CallbackError, CallbackResult, ErrorChain, ErrorHandler, EventHandler, Flow, FnErrorHandler,
    FnHandler, HandlerBatch, HandlerRegistry, Match, RegistryError, DEFAULT_GROUP,
};
pub use limits::{ConcurrencyLimit, LimitError, MAX_CONCURRENCY};
pub use queue::{EventQueue, QueueError};
pub use store::{GlobalData, GlobalView, Record, ScopedData, ScopedView, StateStore};

// Re-export collaborator traits
pub use adapters::{
    ClientError, JobError, JobRunner, OutboundClient, PersistenceBackend, PersistenceError,
};
