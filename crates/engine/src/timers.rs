// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local lease timers for a held lock

use std::time::Duration;
use tokio::task::JoinHandle;

/// Pending warning and expiry callbacks for one lease
///
/// The warning fires after 90% of the lease, the expiry at the full lease.
/// Dropping the guard cancels whichever callbacks have not run yet.
pub(crate) struct LeaseTimers {
    handle: JoinHandle<()>,
}

impl LeaseTimers {
    pub(crate) fn arm<W, E>(lease: Duration, on_warning: W, on_expiry: E) -> Self
    where
        W: FnOnce() + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let warn_after = warning_delay(lease);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(warn_after).await;
            on_warning();
            tokio::time::sleep(lease.saturating_sub(warn_after)).await;
            on_expiry();
        });
        Self { handle }
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LeaseTimers {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Delay before the expiry warning: 90% of the lease
pub(crate) fn warning_delay(lease: Duration) -> Duration {
    lease.saturating_sub(lease / 10)
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;
