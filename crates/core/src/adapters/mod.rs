// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator traits and fakes
//!
//! The engine treats the network layer, outbound client, job subsystem, and
//! persistence backend as external collaborators, specified only at their
//! boundary. Fakes live here so every crate in the workspace tests against
//! the same doubles.

mod fake;
mod traits;

pub use fake::{AdapterCall, FakeClient, FakeJobs, MemoryPersistence};
pub use traits::{
    ClientError, JobError, JobRunner, OutboundClient, PersistenceBackend, PersistenceError,
};
