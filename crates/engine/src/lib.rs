// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Distributed read/write locks over an atomic document store

mod collection;
mod error;
mod events;
mod lock;
pub mod protocol;
mod timers;

pub use collection::LockCollection;
pub use error::{LockError, LockStateError};
pub use events::EventReceiver;
pub use lock::{Acquisition, Lock, LockState, WriteLockOptions};
