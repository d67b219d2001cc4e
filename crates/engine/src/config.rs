// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher configuration

use std::time::Duration;

use courier_core::limits::ConcurrencyLimit;
use serde::Deserialize;
use thiserror::Error;

/// Errors from configuration parsing
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Dispatcher configuration.
///
/// Loadable from TOML; durations accept humantime strings ("500ms", "1m").
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// How many events may resolve concurrently; `0` is sequential and
    /// `"max"` requests the fixed ceiling
    pub concurrency: ConcurrencyLimit,
    /// How long one queue poll waits before the loop re-checks for a stop
    /// request
    #[serde(with = "humantime_serde")]
    pub poll_timeout: Duration,
    /// Interval of the periodic persistence flush (only used when a
    /// persistence backend is configured)
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrency: ConcurrencyLimit::Sequential,
            poll_timeout: Duration::from_secs(1),
            flush_interval: Duration::from_secs(60),
        }
    }
}

impl DispatcherConfig {
    /// Parse a configuration from TOML text; absent fields keep defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
