// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lock operations

use gridlock_adapters::StoreError;
use gridlock_core::{ConfigError, ResourceKey};
use thiserror::Error;

/// Protocol misuse on a lock handle; never reaches the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LockStateError {
    #[error("cannot obtain an already held lock")]
    AlreadyHeld,
    #[error("cannot operate on an unheld lock")]
    NotHeld,
    #[error("lock lease has expired")]
    Expired,
    #[error("cannot remove a shared lock")]
    SharedRemove,
    #[error("lock handle is invalid after a failed operation")]
    Invalid,
}

/// Errors that can occur in lock operations
#[derive(Debug, Error)]
pub enum LockError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("lock state error: {0}")]
    State(#[from] LockStateError),
    #[error("lock record not found for {0}")]
    RecordMissing(ResourceKey),
}

impl LockError {
    /// The state error, if this is one
    pub fn state(&self) -> Option<LockStateError> {
        match self {
            LockError::State(err) => Some(*err),
            _ => None,
        }
    }
}
