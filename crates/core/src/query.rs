// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Match conditions and mutations for atomic conditional updates
//!
//! These descriptors are the vocabulary of the store contract. A store
//! evaluates a [`Filter`] against a record and applies a [`Mutation`] to it
//! in one indivisible step.

use crate::record::{Expiry, LockRecord, ResourceKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Predicate over a lock record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Always,
    WriteLock(bool),
    WriteReq(bool),
    ReadLocksEq(u64),
    ReadLocksAbove(u64),
    /// `expires` lies strictly before the timestamp; `Never` does not match
    ExpiresBefore(DateTime<Utc>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn matches(&self, record: &LockRecord) -> bool {
        match self {
            Condition::Always => true,
            Condition::WriteLock(value) => record.write_lock == *value,
            Condition::WriteReq(value) => record.write_req == *value,
            Condition::ReadLocksEq(n) => record.read_locks == *n,
            Condition::ReadLocksAbove(n) => record.read_locks > *n,
            Condition::ExpiresBefore(instant) => record.expires.is_before(*instant),
            Condition::All(conditions) => conditions.iter().all(|c| c.matches(record)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.matches(record)),
        }
    }
}

/// Selects the record for a resource that also satisfies a condition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub resource: ResourceKey,
    pub condition: Condition,
}

impl Filter {
    /// Match the resource's record unconditionally
    pub fn resource(resource: ResourceKey) -> Self {
        Self {
            resource,
            condition: Condition::Always,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn matches(&self, record: &LockRecord) -> bool {
        record.resource == self.resource && self.condition.matches(record)
    }
}

/// A single field change
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Update {
    SetWriteLock(bool),
    SetWriteReq(bool),
    SetReadLocks(u64),
    IncReadLocks,
    /// Saturates at zero
    DecReadLocks,
    IncReads,
    IncWrites,
    SetExpires(Expiry),
    /// Keep the later of the current and the given deadline
    RaiseExpires(Expiry),
    SetMeta(Option<serde_json::Value>),
}

impl Update {
    fn apply(&self, record: &mut LockRecord) {
        match self {
            Update::SetWriteLock(value) => record.write_lock = *value,
            Update::SetWriteReq(value) => record.write_req = *value,
            Update::SetReadLocks(n) => record.read_locks = *n,
            Update::IncReadLocks => record.read_locks = record.read_locks.saturating_add(1),
            Update::DecReadLocks => record.read_locks = record.read_locks.saturating_sub(1),
            Update::IncReads => record.reads = record.reads.saturating_add(1),
            Update::IncWrites => record.writes = record.writes.saturating_add(1),
            Update::SetExpires(expiry) => record.expires = *expiry,
            Update::RaiseExpires(expiry) => record.expires = record.expires.max(*expiry),
            Update::SetMeta(meta) => record.meta = meta.clone(),
        }
    }
}

/// Ordered list of field changes applied atomically
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub updates: Vec<Update>,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, update: Update) -> Self {
        self.updates.push(update);
        self
    }

    pub fn apply(&self, record: &mut LockRecord) {
        for update in &self.updates {
            update.apply(record);
        }
    }

    /// Record produced when an upsert inserts a fresh document
    pub fn inserted(&self, resource: ResourceKey) -> LockRecord {
        let mut record = LockRecord::new(resource);
        // A fresh record has no prior deadline to raise from
        for update in &self.updates {
            match update {
                Update::RaiseExpires(expiry) => record.expires = *expiry,
                other => other.apply(&mut record),
            }
        }
        record
    }
}

/// Durability acknowledgement requested from the store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteConcern {
    Unacknowledged,
    #[default]
    Acknowledged,
    Majority,
    Nodes(u32),
}

impl std::fmt::Display for WriteConcern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteConcern::Unacknowledged => f.write_str("w=0"),
            WriteConcern::Acknowledged => f.write_str("w=1"),
            WriteConcern::Majority => f.write_str("w=majority"),
            WriteConcern::Nodes(n) => write!(f, "w={}", n),
        }
    }
}

/// Options for a conditional update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a fresh record when nothing matches
    pub upsert: bool,
    /// Return the record after the update rather than before it
    pub return_new: bool,
    pub write_concern: WriteConcern,
}

impl UpdateOptions {
    pub fn new(write_concern: WriteConcern) -> Self {
        Self {
            upsert: false,
            return_new: true,
            write_concern,
        }
    }

    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    pub fn return_old(mut self) -> Self {
        self.return_new = false;
        self
    }
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self::new(WriteConcern::default())
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
