// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gridlock-core: data model for store-coordinated read/write locks
//!
//! This crate provides:
//! - The lock record persisted once per resource key
//! - Typed match conditions and mutations for atomic conditional updates
//! - Lock lifecycle events
//! - Collection configuration and TOML loading
//! - A clock abstraction for testable lease arithmetic

pub mod clock;
pub mod config;
pub mod event;
pub mod query;
pub mod record;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{CollectionConfig, ConfigError, LockOptions};
pub use event::LockEvent;
pub use query::{Condition, Filter, Mutation, Update, UpdateOptions, WriteConcern};
pub use record::{Expiry, LockKind, LockRecord, ResourceKey};
