// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced table wrapper for consistent observability

use crate::store::{LockTable, StoreError};
use async_trait::async_trait;
use gridlock_core::{Filter, LockRecord, Mutation, UpdateOptions, WriteConcern};
use tracing::Instrument;

/// Wrapper that adds tracing to any LockTable
#[derive(Clone)]
pub struct TracedTable<T> {
    inner: T,
}

impl<T> TracedTable<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: LockTable> LockTable for TracedTable<T> {
    async fn conditional_update(
        &self,
        filter: &Filter,
        mutation: &Mutation,
        options: UpdateOptions,
    ) -> Result<Option<LockRecord>, StoreError> {
        let span = tracing::info_span!(
            "table.update",
            resource = %filter.resource,
            upsert = options.upsert,
            w = %options.write_concern,
        );

        async move {
            tracing::debug!(
                condition = ?filter.condition,
                updates = mutation.updates.len(),
                "starting"
            );

            let start = std::time::Instant::now();
            let result = self.inner.conditional_update(filter, mutation, options).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Some(record)) => tracing::debug!(
                    elapsed_ms,
                    read_locks = record.read_locks,
                    write_lock = record.write_lock,
                    write_req = record.write_req,
                    "matched"
                ),
                Ok(None) => tracing::debug!(elapsed_ms, "no match"),
                // Colliding upserts are part of normal contention
                Err(StoreError::DuplicateKey(_)) => {
                    tracing::debug!(elapsed_ms, "duplicate key")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "update failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn conditional_remove(
        &self,
        filter: &Filter,
        write_concern: WriteConcern,
    ) -> Result<Option<LockRecord>, StoreError> {
        let span = tracing::info_span!(
            "table.remove",
            resource = %filter.resource,
            w = %write_concern,
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.conditional_remove(filter, write_concern).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Some(_)) => tracing::info!(elapsed_ms, "record removed"),
                Ok(None) => tracing::warn!(elapsed_ms, "no record to remove"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "remove failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn ensure_unique_key(&self) -> Result<(), StoreError> {
        let span = tracing::info_span!("table.ensure_unique_key");

        async move {
            let result = self.inner.ensure_unique_key().await;
            match &result {
                Ok(()) => tracing::info!("unique key ensured"),
                Err(e) => tracing::error!(error = %e, "unique key failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
