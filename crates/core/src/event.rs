// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events emitted by lock handles

use crate::record::LockRecord;
use serde::{Deserialize, Serialize};

/// Events observed on a lock handle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LockEvent {
    /// A shared or exclusive lock was granted
    Locked(LockRecord),
    /// An acquisition gave up after its timeout
    TimedOut,
    /// 90% of the lease has elapsed without a renewal
    ExpiresSoon(LockRecord),
    /// The lease elapsed locally; the handle is no longer usable
    Expired(LockRecord),
    Renewed(LockRecord),
    Released(LockRecord),
    Removed(LockRecord),
    /// A waiting writer flagged the record to block new readers
    WriteReqSet,
    /// An operation failed
    Error { message: String },
}

impl LockEvent {
    /// Event name as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            LockEvent::Locked(_) => "locked",
            LockEvent::TimedOut => "timed-out",
            LockEvent::ExpiresSoon(_) => "expires-soon",
            LockEvent::Expired(_) => "expired",
            LockEvent::Renewed(_) => "renewed",
            LockEvent::Released(_) => "released",
            LockEvent::Removed(_) => "removed",
            LockEvent::WriteReqSet => "write-req-set",
            LockEvent::Error { .. } => "error",
        }
    }

    /// Record carried by the event, if any
    pub fn record(&self) -> Option<&LockRecord> {
        match self {
            LockEvent::Locked(record)
            | LockEvent::ExpiresSoon(record)
            | LockEvent::Expired(record)
            | LockEvent::Renewed(record)
            | LockEvent::Released(record)
            | LockEvent::Removed(record) => Some(record),
            LockEvent::TimedOut | LockEvent::WriteReqSet | LockEvent::Error { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
