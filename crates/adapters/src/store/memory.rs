// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process atomic document store
//!
//! Every table operation runs under the table's mutex, which gives the same
//! per-document atomicity a networked store provides. Handles are cheap
//! clones sharing the same tables, so several "processes" in one test can
//! contend on one record.

use super::{LockTable, StoreError};
use async_trait::async_trait;
use gridlock_core::{Filter, LockRecord, Mutation, UpdateOptions, WriteConcern};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct TableState {
    /// Records in insertion order
    records: Vec<LockRecord>,
    unique_key: bool,
}

/// A store holding named tables
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Arc<Mutex<TableState>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a table by name, creating it on first use
    pub fn table(&self, name: &str) -> MemoryTable {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let state = tables.entry(name.to_string()).or_default().clone();
        MemoryTable {
            name: name.to_string(),
            state,
        }
    }

    /// Names of all tables opened so far
    pub fn table_names(&self) -> Vec<String> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Handle to one table of a [`MemoryStore`]
#[derive(Clone, Debug)]
pub struct MemoryTable {
    name: String,
    state: Arc<Mutex<TableState>>,
}

impl MemoryTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of every record in the table
    pub fn records(&self) -> Vec<LockRecord> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .clone()
    }

    /// First record for the resource, if any
    pub fn find(&self, resource: &str) -> Option<LockRecord> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .iter()
            .find(|r| r.resource.as_str() == resource)
            .cloned()
    }

    pub fn has_unique_key(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .unique_key
    }

    /// Apply a conditional update synchronously
    pub fn update_now(
        &self,
        filter: &Filter,
        mutation: &Mutation,
        options: UpdateOptions,
    ) -> Result<Option<LockRecord>, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(record) = state.records.iter_mut().find(|r| filter.matches(r)) {
            let before = record.clone();
            mutation.apply(record);
            return Ok(Some(if options.return_new {
                record.clone()
            } else {
                before
            }));
        }

        if !options.upsert {
            return Ok(None);
        }

        let key_taken = state.records.iter().any(|r| r.resource == filter.resource);
        if key_taken && state.unique_key {
            return Err(StoreError::DuplicateKey(filter.resource.clone()));
        }

        let inserted = mutation.inserted(filter.resource.clone());
        state.records.push(inserted.clone());
        Ok(options.return_new.then_some(inserted))
    }

    /// Apply a conditional remove synchronously
    pub fn remove_now(&self, filter: &Filter) -> Option<LockRecord> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let index = state.records.iter().position(|r| filter.matches(r))?;
        Some(state.records.remove(index))
    }
}

#[async_trait]
impl LockTable for MemoryTable {
    async fn conditional_update(
        &self,
        filter: &Filter,
        mutation: &Mutation,
        options: UpdateOptions,
    ) -> Result<Option<LockRecord>, StoreError> {
        self.update_now(filter, mutation, options)
    }

    async fn conditional_remove(
        &self,
        filter: &Filter,
        _write_concern: WriteConcern,
    ) -> Result<Option<LockRecord>, StoreError> {
        Ok(self.remove_now(filter))
    }

    async fn ensure_unique_key(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.unique_key {
            return Ok(());
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = state.records.iter().find(|r| !seen.insert(&r.resource)) {
            return Err(StoreError::DuplicateKey(dup.resource.clone()));
        }

        state.unique_key = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
