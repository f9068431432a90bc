// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of lock events to subscribers

use gridlock_core::LockEvent;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Receiver for lock events
pub type EventReceiver = mpsc::UnboundedReceiver<LockEvent>;

type EventSender = mpsc::UnboundedSender<LockEvent>;

/// Delivers every event to each live subscriber
///
/// Shared between a lock handle and its lease timer task. Subscribers whose
/// receiver has been dropped are pruned on the next emit.
#[derive(Clone, Default)]
pub(crate) struct EventEmitter {
    subscribers: Arc<Mutex<Vec<EventSender>>>,
}

impl EventEmitter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: LockEvent) {
        tracing::trace!(event = event.name(), "emit");
        let mut subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
