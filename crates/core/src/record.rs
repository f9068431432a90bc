// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock record stored in the shared table
//!
//! One record exists per resource key. All lock state that other processes
//! observe lives here; handles only keep a snapshot of the last record seen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque identifier of a locked resource
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(pub String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ResourceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Shared (read) or exclusive (write) access
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    Shared,
    Exclusive,
}

impl LockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockKind::Shared => "shared",
            LockKind::Exclusive => "exclusive",
        }
    }
}

impl std::fmt::Display for LockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lease deadline of a record
///
/// `Never` orders after every timestamp, so raising an expiry to `Never`
/// is permanent and `Never` is never "in the past".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    At(DateTime<Utc>),
    Never,
}

impl Expiry {
    /// Deadline `lease` after `now`; no lease means the record never expires.
    ///
    /// Saturates to `Never` when the deadline is not representable.
    pub fn after(now: DateTime<Utc>, lease: Option<Duration>) -> Self {
        let Some(lease) = lease else {
            return Expiry::Never;
        };
        chrono::Duration::from_std(lease)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .map_or(Expiry::Never, Expiry::At)
    }

    /// True if the deadline lies strictly before `instant`
    pub fn is_before(&self, instant: DateTime<Utc>) -> bool {
        match self {
            Expiry::At(at) => *at < instant,
            Expiry::Never => false,
        }
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::At(at) => Some(*at),
            Expiry::Never => None,
        }
    }
}

/// The persisted lock document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub resource: ResourceKey,
    /// Number of shared locks currently held
    pub read_locks: u64,
    /// An exclusive lock is currently held
    pub write_lock: bool,
    /// A writer is waiting; new shared grants are blocked
    pub write_req: bool,
    pub expires: Expiry,
    /// Total shared grants, diagnostic only
    pub reads: u64,
    /// Total exclusive grants, diagnostic only
    pub writes: u64,
    /// Caller-supplied side information, cleared on release
    pub meta: Option<serde_json::Value>,
}

impl LockRecord {
    /// A fresh, unheld record as inserted by an upsert
    pub fn new(resource: ResourceKey) -> Self {
        Self {
            resource,
            read_locks: 0,
            write_lock: false,
            write_req: false,
            expires: Expiry::Never,
            reads: 0,
            writes: 0,
            meta: None,
        }
    }

    /// No shared or exclusive lock is held
    pub fn is_idle(&self) -> bool {
        self.read_locks == 0 && !self.write_lock
    }

    /// Kind of lock currently held on the record, if any
    pub fn held_kind(&self) -> Option<LockKind> {
        if self.write_lock {
            Some(LockKind::Exclusive)
        } else if self.read_locks > 0 {
            Some(LockKind::Shared)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
