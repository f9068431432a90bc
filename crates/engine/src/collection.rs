// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock collections: namespace defaults bound to a bootstrapped table

use crate::error::LockError;
use gridlock_adapters::LockTable;
use gridlock_core::{Clock, CollectionConfig, SystemClock};
use std::sync::Arc;

struct Inner<T, C> {
    table: T,
    config: CollectionConfig,
    clock: C,
}

/// Shared configuration and table handle for a namespace of locks
///
/// Only obtainable through [`LockCollection::create`] or
/// [`LockCollection::with_clock`], which bootstrap the unique key on the
/// table first. Immutable afterwards; clones share the same state.
pub struct LockCollection<T, C = SystemClock> {
    inner: Arc<Inner<T, C>>,
}

impl<T, C> Clone for LockCollection<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: LockTable> LockCollection<T, SystemClock> {
    /// Validate `config`, ensure the unique key on `table`, and resolve once ready
    pub async fn create(table: T, config: CollectionConfig) -> Result<Self, LockError> {
        Self::with_clock(table, config, SystemClock).await
    }
}

impl<T: LockTable, C: Clock> LockCollection<T, C> {
    pub async fn with_clock(table: T, config: CollectionConfig, clock: C) -> Result<Self, LockError> {
        if let Err(e) = config.validate() {
            tracing::error!(namespace = %config.namespace, error = %e, "invalid lock collection config");
            return Err(e.into());
        }

        if let Err(e) = table.ensure_unique_key().await {
            tracing::error!(namespace = %config.namespace, error = %e, "lock collection bootstrap failed");
            return Err(e.into());
        }

        tracing::info!(
            namespace = %config.namespace,
            table = %config.table_name(),
            "lock collection ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                table,
                config,
                clock,
            }),
        })
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.inner.config
    }

    pub fn namespace(&self) -> &str {
        &self.inner.config.namespace
    }

    pub fn table(&self) -> &T {
        &self.inner.table
    }

    pub fn clock(&self) -> &C {
        &self.inner.clock
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
