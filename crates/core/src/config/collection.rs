// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock collection configuration
//!
//! Namespace-wide defaults shared by every lock in a collection, plus the
//! per-lock overrides that fall back to them.

use crate::query::WriteConcern;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from configuration validation and loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),
    #[error("polling interval must be greater than zero")]
    ZeroPollingInterval,
    #[error("lease duration must be greater than zero")]
    ZeroLease,
    #[error("invalid write concern: {0}")]
    InvalidWriteConcern(WriteConcern),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Defaults for all locks in a namespace
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Prefix of the lock table name
    pub namespace: String,
    pub write_concern: WriteConcern,
    /// Delay between acquisition attempts while waiting
    #[serde(with = "humantime_serde")]
    pub polling_interval: Duration,
    /// How long an unrenewed lock stays valid; `None` never expires
    ///
    /// A zero lease is rejected as [`ConfigError::ZeroLease`] rather than
    /// read as "never expires". Leave the field out for unbounded leases.
    #[serde(with = "humantime_serde")]
    pub lease_duration: Option<Duration>,
    /// How long to keep polling for an unavailable lock; zero tries once
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Side information stored in lock records while held
    pub metadata: Option<serde_json::Value>,
}

impl CollectionConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: CollectionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = write_concern;
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    pub fn with_lease_duration(mut self, lease: Duration) -> Self {
        self.lease_duration = Some(lease);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Name of the table holding this namespace's lock records
    pub fn table_name(&self) -> String {
        format!("{}.locks", self.namespace)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() || self.namespace.contains(['$', '\0']) {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        if self.polling_interval.is_zero() {
            return Err(ConfigError::ZeroPollingInterval);
        }
        if self.lease_duration.is_some_and(|lease| lease.is_zero()) {
            return Err(ConfigError::ZeroLease);
        }
        if self.write_concern == WriteConcern::Nodes(0) {
            return Err(ConfigError::InvalidWriteConcern(self.write_concern));
        }
        Ok(())
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            namespace: "fs".to_string(),
            write_concern: WriteConcern::Acknowledged,
            polling_interval: Duration::from_secs(5),
            lease_duration: None,
            timeout: Duration::ZERO,
            metadata: None,
        }
    }
}

/// Per-lock overrides; unset fields fall back to the collection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    #[serde(with = "humantime_serde")]
    pub polling_interval: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub lease_duration: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub metadata: Option<serde_json::Value>,
}

impl LockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = Some(interval);
        self
    }

    pub fn with_lease_duration(mut self, lease: Duration) -> Self {
        self.lease_duration = Some(lease);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
