// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lock table for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LockTable, MemoryStore, MemoryTable, StoreError};
use async_trait::async_trait;
use gridlock_core::{Filter, LockRecord, Mutation, UpdateOptions, WriteConcern};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Recorded table call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Update {
        filter: Filter,
        mutation: Mutation,
        options: UpdateOptions,
    },
    Remove {
        filter: Filter,
        write_concern: WriteConcern,
    },
    EnsureUniqueKey,
}

/// Write run against the underlying table just before a call lands
type Interleave = Box<dyn FnOnce(&MemoryTable) + Send>;

/// What happens to an upcoming call
enum Injection {
    Pass,
    Fail(StoreError),
    Interleave(Interleave),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<StoreCall>,
    /// Injections queued for upcoming calls, in order
    injections: VecDeque<Injection>,
}

/// Fake table: a real in-memory table plus call recording and failure injection
#[derive(Clone)]
pub struct FakeTable {
    inner: MemoryTable,
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTable {
    pub fn new() -> Self {
        Self::wrap(MemoryStore::new().table("fs.locks"))
    }

    /// Record calls made against an existing table
    pub fn wrap(inner: MemoryTable) -> Self {
        Self {
            inner,
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    /// Underlying table, for inspecting or seeding records
    pub fn table(&self) -> &MemoryTable {
        &self.inner
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Get only the recorded mutating calls
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, StoreCall::EnsureUniqueKey))
            .collect()
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: StoreError) {
        self.inject(Injection::Fail(error));
    }

    /// Let the next call through untouched; queues ahead of later injections
    pub fn succeed_next(&self) {
        self.inject(Injection::Pass);
    }

    /// Run `write` against the underlying table right before the next call,
    /// as if another process got there first
    pub fn interleave_next(&self, write: impl FnOnce(&MemoryTable) + Send + 'static) {
        self.inject(Injection::Interleave(Box::new(write)));
    }

    fn inject(&self, injection: Injection) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .injections
            .push_back(injection);
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        let injection = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.calls.push(call);
            state.injections.pop_front()
        };
        match injection {
            Some(Injection::Fail(err)) => Err(err),
            Some(Injection::Interleave(write)) => {
                write(&self.inner);
                Ok(())
            }
            Some(Injection::Pass) | None => Ok(()),
        }
    }
}

#[async_trait]
impl LockTable for FakeTable {
    async fn conditional_update(
        &self,
        filter: &Filter,
        mutation: &Mutation,
        options: UpdateOptions,
    ) -> Result<Option<LockRecord>, StoreError> {
        self.record(StoreCall::Update {
            filter: filter.clone(),
            mutation: mutation.clone(),
            options,
        })?;
        self.inner.conditional_update(filter, mutation, options).await
    }

    async fn conditional_remove(
        &self,
        filter: &Filter,
        write_concern: WriteConcern,
    ) -> Result<Option<LockRecord>, StoreError> {
        self.record(StoreCall::Remove {
            filter: filter.clone(),
            write_concern,
        })?;
        self.inner.conditional_remove(filter, write_concern).await
    }

    async fn ensure_unique_key(&self) -> Result<(), StoreError> {
        self.record(StoreCall::EnsureUniqueKey)?;
        self.inner.ensure_unique_key().await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
