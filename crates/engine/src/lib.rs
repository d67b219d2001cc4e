//! courier-engine: the courier event-dispatch engine
//!
//! The [`Dispatcher`] drains an event queue and routes each event through
//! ordered handler groups with bounded concurrency, per-event error
//! isolation, and lifecycle management over its collaborators.

mod admission;
mod config;
mod dispatch;
mod dispatcher;
mod error;
mod lifecycle;
mod tasks;

pub use admission::Admission;
pub use config::{ConfigError, DispatcherConfig};
pub use dispatcher::{Dispatcher, DispatcherDeps};
pub use error::{EngineError, MigrateError};
pub use lifecycle::RunningState;
pub use tasks::TaskSet;
