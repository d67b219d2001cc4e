// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered registry of handler groups
//!
//! Groups are visited in ascending numeric order; within a group, handlers
//! keep insertion order. Removal identifies a handler by pointer identity.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::handler::EventHandler;

/// Group used when callers do not pick one explicitly
pub const DEFAULT_GROUP: i32 = 0;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("group {0} has no registered handlers")]
    GroupNotFound(i32),
    #[error("handler is not registered in group {0}")]
    HandlerNotFound(i32),
    #[error("the group argument cannot be combined with grouped handlers")]
    GroupWithGrouped,
}

/// A batch of handlers for [`HandlerRegistry::add_many`]: either a flat
/// sequence destined for one group, or a pre-grouped mapping.
pub enum HandlerBatch {
    Sequence(Vec<Arc<dyn EventHandler>>),
    Grouped(BTreeMap<i32, Vec<Arc<dyn EventHandler>>>),
}

impl From<Vec<Arc<dyn EventHandler>>> for HandlerBatch {
    fn from(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        HandlerBatch::Sequence(handlers)
    }
}

impl From<BTreeMap<i32, Vec<Arc<dyn EventHandler>>>> for HandlerBatch {
    fn from(groups: BTreeMap<i32, Vec<Arc<dyn EventHandler>>>) -> Self {
        HandlerBatch::Grouped(groups)
    }
}

/// Ordered collection of handler groups.
#[derive(Default)]
pub struct HandlerRegistry {
    groups: BTreeMap<i32, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Append a handler to the end of `group`, creating the group if absent.
    pub fn add(&mut self, handler: Arc<dyn EventHandler>, group: i32) {
        self.groups.entry(group).or_default().push(handler);
    }

    /// Register a batch of handlers.
    ///
    /// With [`HandlerBatch::Sequence`] the handlers land in `group` (or the
    /// default group). With [`HandlerBatch::Grouped`] the mapping already
    /// carries group numbers, so supplying `group` as well is an error.
    pub fn add_many(
        &mut self,
        batch: impl Into<HandlerBatch>,
        group: Option<i32>,
    ) -> Result<(), RegistryError> {
        match batch.into() {
            HandlerBatch::Sequence(handlers) => {
                let group = group.unwrap_or(DEFAULT_GROUP);
                for handler in handlers {
                    self.add(handler, group);
                }
                Ok(())
            }
            HandlerBatch::Grouped(_) if group.is_some() => Err(RegistryError::GroupWithGrouped),
            HandlerBatch::Grouped(grouped) => {
                for (group, handlers) in grouped {
                    for handler in handlers {
                        self.add(handler, group);
                    }
                }
                Ok(())
            }
        }
    }

    /// Remove a handler from `group` by identity.
    ///
    /// Removing the last handler of a group removes the group itself.
    pub fn remove(&mut self, handler: &Arc<dyn EventHandler>, group: i32) -> Result<(), RegistryError> {
        let handlers = self
            .groups
            .get_mut(&group)
            .ok_or(RegistryError::GroupNotFound(group))?;

        let position = handlers
            .iter()
            .position(|registered| Arc::ptr_eq(registered, handler))
            .ok_or(RegistryError::HandlerNotFound(group))?;

        handlers.remove(position);
        if handlers.is_empty() {
            self.groups.remove(&group);
        }
        Ok(())
    }

    /// Snapshot of all groups in ascending order, for one event's
    /// resolution. Cloning the `Arc`s decouples resolution from concurrent
    /// registry mutation.
    pub fn snapshot(&self) -> Vec<(i32, Vec<Arc<dyn EventHandler>>)> {
        self.groups
            .iter()
            .map(|(group, handlers)| (*group, handlers.clone()))
            .collect()
    }

    /// Group numbers currently present, ascending
    pub fn group_numbers(&self) -> Vec<i32> {
        self.groups.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
