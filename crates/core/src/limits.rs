// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrency limit for event processing
//!
//! A limit of zero means strictly sequential processing; `Max` requests
//! maximal concurrency but still resolves to a fixed ceiling so worst-case
//! resource use stays bounded.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use thiserror::Error;

/// Ceiling applied when maximal concurrency is requested
pub const MAX_CONCURRENCY: usize = 4096;

/// Errors from limit construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitError {
    #[error("concurrency limit must be a non-negative integer, got {0}")]
    Negative(i64),
}

/// How many events may have their resolution in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyLimit {
    /// One event at a time; the loop awaits each blocking resolution inline
    Sequential,
    /// At most this many resolutions in flight
    Bounded(usize),
    /// As many as the fixed ceiling allows
    Max,
}

impl ConcurrencyLimit {
    /// Validate a configured value. Zero is sequential, negatives are
    /// rejected.
    pub fn from_value(value: i64) -> Result<Self, LimitError> {
        if value < 0 {
            return Err(LimitError::Negative(value));
        }
        if value == 0 {
            Ok(ConcurrencyLimit::Sequential)
        } else {
            Ok(ConcurrencyLimit::Bounded(value as usize))
        }
    }

    /// Effective number of concurrently-resolving events this limit allows.
    pub fn effective(&self) -> usize {
        match self {
            ConcurrencyLimit::Sequential => 0,
            ConcurrencyLimit::Bounded(n) => *n,
            ConcurrencyLimit::Max => MAX_CONCURRENCY,
        }
    }

    /// Whether resolutions may interleave at all
    pub fn is_concurrent(&self) -> bool {
        self.effective() > 0
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        ConcurrencyLimit::Sequential
    }
}

// Accepts either an integer or the string "max" in configuration files.
impl<'de> Deserialize<'de> for ConcurrencyLimit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(i64),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => ConcurrencyLimit::from_value(n).map_err(de::Error::custom),
            Raw::Keyword(s) if s == "max" => Ok(ConcurrencyLimit::Max),
            Raw::Keyword(s) => Err(de::Error::custom(format!(
                "expected a non-negative integer or \"max\", got \"{s}\""
            ))),
        }
    }
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
