// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic document store adapters

mod memory;

pub use memory::{MemoryStore, MemoryTable};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTable, StoreCall};

use async_trait::async_trait;
use gridlock_core::{Filter, LockRecord, Mutation, ResourceKey, UpdateOptions, WriteConcern};
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An upsert collided with an existing record on the unique key
    #[error("duplicate key: {0}")]
    DuplicateKey(ResourceKey),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Backend(String),
}

/// A table of lock records supporting single-document atomic operations
///
/// This is the whole contract the lock protocol needs from a store. Each call
/// must evaluate its filter and apply its mutation indivisibly with respect to
/// every other call on the same record.
#[async_trait]
pub trait LockTable: Clone + Send + Sync + 'static {
    /// Find the record matching `filter` and apply `mutation` to it
    ///
    /// Returns the record after (or before, per `options.return_new`) the
    /// update, or `None` when nothing matched and no upsert happened.
    async fn conditional_update(
        &self,
        filter: &Filter,
        mutation: &Mutation,
        options: UpdateOptions,
    ) -> Result<Option<LockRecord>, StoreError>;

    /// Find the record matching `filter` and delete it, returning it
    async fn conditional_remove(
        &self,
        filter: &Filter,
        write_concern: WriteConcern,
    ) -> Result<Option<LockRecord>, StoreError>;

    /// Ensure at most one record can exist per resource key (idempotent)
    async fn ensure_unique_key(&self) -> Result<(), StoreError>;
}
