// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock handle state machine
//!
//! A [`Lock`] is one process's handle on one resource. It drives the
//! conditional updates in [`crate::protocol`] against the collection's table,
//! keeps a snapshot of the last record it saw, and arms local lease timers
//! while it holds the lock.

use crate::collection::LockCollection;
use crate::error::{LockError, LockStateError};
use crate::events::{EventEmitter, EventReceiver};
use crate::protocol::{self, Claim};
use crate::timers::LeaseTimers;
use chrono::{DateTime, Utc};
use gridlock_adapters::{LockTable, StoreError};
use gridlock_core::{
    Clock, ConfigError, LockEvent, LockKind, LockOptions, LockRecord, ResourceKey, SystemClock,
    UpdateOptions,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Lifecycle state of a lock handle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Unheld,
    /// An obtain call is polling for the lock
    Acquiring(LockKind),
    Held(LockKind),
    /// The lease elapsed locally before it was renewed or released
    Expired,
    /// A held-lock operation failed; the record state is unknown
    Invalid,
}

impl LockState {
    fn require_held(&self) -> Result<LockKind, LockStateError> {
        match self {
            LockState::Held(kind) => Ok(*kind),
            LockState::Unheld | LockState::Acquiring(_) => Err(LockStateError::NotHeld),
            LockState::Expired => Err(LockStateError::Expired),
            LockState::Invalid => Err(LockStateError::Invalid),
        }
    }
}

/// Outcome of an obtain call
#[derive(Clone, Debug, PartialEq)]
pub enum Acquisition {
    Locked(LockRecord),
    /// The lock stayed unavailable for the whole timeout
    TimedOut,
}

impl Acquisition {
    pub fn is_locked(&self) -> bool {
        matches!(self, Acquisition::Locked(_))
    }

    pub fn record(&self) -> Option<&LockRecord> {
        match self {
            Acquisition::Locked(record) => Some(record),
            Acquisition::TimedOut => None,
        }
    }
}

/// Knobs for an exclusive obtain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteLockOptions {
    /// Leave `write_req` set when the wait times out. Test harnesses use this
    /// to simulate a writer that died while waiting.
    pub keep_write_req_on_timeout: bool,
}

/// State shared with the lease timer task
struct Shared {
    state: LockState,
    held: Option<LockRecord>,
    /// Bumped whenever the armed timers are superseded; stale callbacks see
    /// a different value and do nothing.
    lease_epoch: u64,
}

/// Handle on a single resource lock
pub struct Lock<T, C = SystemClock> {
    resource: ResourceKey,
    collection: LockCollection<T, C>,
    created_at: DateTime<Utc>,
    polling_interval: Duration,
    lease: Option<Duration>,
    timeout: Duration,
    metadata: Option<serde_json::Value>,
    shared: Arc<Mutex<Shared>>,
    events: EventEmitter,
    timers: Option<LeaseTimers>,
}

impl<T: LockTable, C: Clock> Lock<T, C> {
    /// Create an unheld handle, resolving unset options from the collection
    pub fn new(
        resource: impl Into<ResourceKey>,
        collection: &LockCollection<T, C>,
        options: LockOptions,
    ) -> Result<Self, LockError> {
        let defaults = collection.config();
        let polling_interval = options
            .polling_interval
            .unwrap_or(defaults.polling_interval);
        let lease = options.lease_duration.or(defaults.lease_duration);
        let timeout = options.timeout.unwrap_or(defaults.timeout);
        let metadata = options.metadata.or_else(|| defaults.metadata.clone());

        if polling_interval.is_zero() {
            return Err(ConfigError::ZeroPollingInterval.into());
        }
        if lease.is_some_and(|lease| lease.is_zero()) {
            return Err(ConfigError::ZeroLease.into());
        }

        Ok(Self {
            resource: resource.into(),
            collection: collection.clone(),
            created_at: collection.clock().now(),
            polling_interval,
            lease,
            timeout,
            metadata,
            shared: Arc::new(Mutex::new(Shared {
                state: LockState::Unheld,
                held: None,
                lease_epoch: 0,
            })),
            events: EventEmitter::new(),
            timers: None,
        })
    }

    /// Receive every event emitted by this handle from now on
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn resource(&self) -> &ResourceKey {
        &self.resource
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Lease granted on each obtain or renew; `None` never expires
    pub fn lease_duration(&self) -> Option<Duration> {
        self.lease
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    pub fn state(&self) -> LockState {
        self.shared().state
    }

    /// Snapshot of the record as of the last successful operation
    pub fn held_record(&self) -> Option<LockRecord> {
        self.shared().held.clone()
    }

    pub fn is_expired(&self) -> bool {
        self.state() == LockState::Expired
    }

    pub async fn obtain_read_lock(&mut self) -> Result<Acquisition, LockError> {
        self.obtain(LockKind::Shared, WriteLockOptions::default()).await
    }

    pub async fn obtain_write_lock(&mut self) -> Result<Acquisition, LockError> {
        self.obtain_write_lock_with(WriteLockOptions::default()).await
    }

    pub async fn obtain_write_lock_with(
        &mut self,
        options: WriteLockOptions,
    ) -> Result<Acquisition, LockError> {
        self.obtain(LockKind::Exclusive, options).await
    }

    /// Push the lease out by another lease duration
    pub async fn renew_lock(&mut self) -> Result<LockRecord, LockError> {
        let span = tracing::info_span!("lock.renew", resource = %self.resource);
        let result = self.renew().instrument(span).await;
        self.report(result)
    }

    pub async fn release_lock(&mut self) -> Result<LockRecord, LockError> {
        let span = tracing::info_span!("lock.release", resource = %self.resource);
        let result = self.release().instrument(span).await;
        self.report(result)
    }

    /// Delete the record outright; only an exclusive holder may do this
    pub async fn remove_lock(&mut self) -> Result<LockRecord, LockError> {
        let span = tracing::info_span!("lock.remove", resource = %self.resource);
        let result = self.remove().instrument(span).await;
        self.report(result)
    }

    async fn obtain(
        &mut self,
        kind: LockKind,
        options: WriteLockOptions,
    ) -> Result<Acquisition, LockError> {
        let span = tracing::info_span!("lock.obtain", resource = %self.resource, %kind);
        let result = self.acquire(kind, options).instrument(span).await;
        self.report(result)
    }

    async fn acquire(
        &mut self,
        kind: LockKind,
        options: WriteLockOptions,
    ) -> Result<Acquisition, LockError> {
        {
            let mut shared = self.shared();
            if let LockState::Held(_) = shared.state {
                return Err(LockStateError::AlreadyHeld.into());
            }
            shared.state = LockState::Acquiring(kind);
            shared.held = None;
            shared.lease_epoch += 1;
        }
        self.timers = None;

        match self.poll_for_grant(kind, options).await {
            Ok(Acquisition::Locked(record)) => {
                self.set_state(LockState::Held(kind), Some(record.clone()));
                self.arm_timers();
                tracing::info!(
                    read_locks = record.read_locks,
                    reads = record.reads,
                    writes = record.writes,
                    "lock granted"
                );
                self.events.emit(LockEvent::Locked(record.clone()));
                Ok(Acquisition::Locked(record))
            }
            Ok(Acquisition::TimedOut) => {
                self.set_state(LockState::Unheld, None);
                tracing::info!(timeout_ms = self.timeout.as_millis() as u64, "lock request timed out");
                self.events.emit(LockEvent::TimedOut);
                Ok(Acquisition::TimedOut)
            }
            Err(e) => {
                self.set_state(LockState::Unheld, None);
                Err(e)
            }
        }
    }

    /// Attempt the claim until it matches or the timeout elapses
    async fn poll_for_grant(
        &self,
        kind: LockKind,
        options: WriteLockOptions,
    ) -> Result<Acquisition, LockError> {
        // Counted per call so a reused handle gets its full timeout again;
        // `created_at` is kept for diagnostics only.
        let started = Instant::now();
        let mut requested = false;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let claim = Claim {
                resource: &self.resource,
                now: self.collection.clock().now(),
                lease: self.lease,
                polling_interval: self.polling_interval,
                metadata: self.metadata.as_ref(),
            };
            let (filter, mutation) = match kind {
                LockKind::Shared => protocol::read_claim(&claim),
                LockKind::Exclusive => protocol::write_claim(&claim),
            };

            match self
                .table()
                .conditional_update(&filter, &mutation, self.update_options().upsert())
                .await
            {
                Ok(Some(record)) => return Ok(Acquisition::Locked(record)),
                Ok(None) => tracing::debug!(attempt, "lock unavailable"),
                Err(StoreError::DuplicateKey(_)) => {
                    tracing::debug!(attempt, "lock record created concurrently")
                }
                Err(e) => return Err(e.into()),
            }

            if started.elapsed() >= self.timeout {
                if requested && !options.keep_write_req_on_timeout {
                    self.withdraw_write_request().await?;
                }
                return Ok(Acquisition::TimedOut);
            }

            if kind == LockKind::Exclusive {
                self.request_write().await?;
                requested = true;
            }
            tokio::time::sleep(self.polling_interval).await;
        }
    }

    async fn request_write(&self) -> Result<(), LockError> {
        let (filter, mutation) = protocol::write_request(&self.resource);
        let flagged = self
            .table()
            .conditional_update(&filter, &mutation, self.update_options())
            .await?;
        if flagged.is_some() {
            tracing::debug!("write request set");
            self.events.emit(LockEvent::WriteReqSet);
        }
        Ok(())
    }

    /// Clear the waiting-writer flag after a timed-out wait
    ///
    /// The flag is shared, so this also clears it for any other writer still
    /// waiting. New readers may be granted until that writer's next poll sets
    /// it again; the window is accepted.
    async fn withdraw_write_request(&self) -> Result<(), LockError> {
        let (filter, mutation) = protocol::withdraw_write_request(&self.resource);
        self.table()
            .conditional_update(&filter, &mutation, self.update_options())
            .await?;
        tracing::debug!("write request withdrawn");
        Ok(())
    }

    async fn renew(&mut self) -> Result<LockRecord, LockError> {
        let kind = self.suspend_lease()?;
        let now = self.collection.clock().now();
        let (filter, mutation) = protocol::renewal(&self.resource, now, self.lease);

        let outcome = self
            .table()
            .conditional_update(&filter, &mutation, self.update_options())
            .await;
        let record = self.require_record(outcome)?;

        self.set_state(LockState::Held(kind), Some(record.clone()));
        self.arm_timers();
        tracing::info!(expires = ?record.expires, "lock renewed");
        self.events.emit(LockEvent::Renewed(record.clone()));
        Ok(record)
    }

    async fn release(&mut self) -> Result<LockRecord, LockError> {
        let kind = self.suspend_lease()?;
        let now = self.collection.clock().now();
        let (filter, mutation) = protocol::release(&self.resource, kind, now);

        let outcome = self
            .table()
            .conditional_update(&filter, &mutation, self.update_options())
            .await;
        let record = self.require_record(outcome)?;
        self.set_state(LockState::Unheld, None);

        let record = if record.is_idle() {
            self.settle_idle(record, now).await
        } else {
            record
        };

        tracing::info!(%kind, read_locks = record.read_locks, "lock released");
        self.events.emit(LockEvent::Released(record.clone()));
        Ok(record)
    }

    /// Best-effort reset of an idle record's deadline after a release
    async fn settle_idle(&self, record: LockRecord, now: DateTime<Utc>) -> LockRecord {
        let (filter, mutation) = protocol::settle_idle(&self.resource, now);
        match self
            .table()
            .conditional_update(&filter, &mutation, self.update_options())
            .await
        {
            Ok(Some(settled)) => settled,
            Ok(None) => {
                tracing::debug!("record claimed again before idle reset");
                record
            }
            Err(e) => {
                tracing::warn!(error = %e, "idle lock reset failed");
                record
            }
        }
    }

    async fn remove(&mut self) -> Result<LockRecord, LockError> {
        let kind = self.shared().state.require_held()?;
        if kind == LockKind::Shared {
            return Err(LockStateError::SharedRemove.into());
        }
        self.suspend_lease()?;

        let filter = protocol::removal(&self.resource);
        let outcome = self
            .table()
            .conditional_remove(&filter, self.collection.config().write_concern)
            .await;
        let record = self.require_record(outcome)?;

        self.set_state(LockState::Unheld, None);
        tracing::info!("lock record removed");
        self.events.emit(LockEvent::Removed(record.clone()));
        Ok(record)
    }

    /// Check the handle is held and cancel its lease timers
    ///
    /// The check and the cancel happen under one lock so an expiry callback
    /// cannot slip in between them.
    fn suspend_lease(&mut self) -> Result<LockKind, LockStateError> {
        let kind = {
            let mut shared = self.shared();
            let kind = shared.state.require_held()?;
            shared.lease_epoch += 1;
            kind
        };
        self.timers = None;
        Ok(kind)
    }

    fn arm_timers(&mut self) {
        let epoch = {
            let mut shared = self.shared();
            shared.lease_epoch += 1;
            shared.lease_epoch
        };

        self.timers = self.lease.map(|lease| {
            let warning = LeaseCallback {
                shared: Arc::clone(&self.shared),
                events: self.events.clone(),
                resource: self.resource.clone(),
                epoch,
            };
            let expiry = warning.clone();
            LeaseTimers::arm(lease, move || warning.warn(), move || expiry.expire())
        });
    }

    /// Unwrap the record a held-lock operation returned, or invalidate the
    /// handle when the store failed or the record was gone
    fn require_record(
        &mut self,
        outcome: Result<Option<LockRecord>, StoreError>,
    ) -> Result<LockRecord, LockError> {
        let err = match outcome {
            Ok(Some(record)) => return Ok(record),
            Ok(None) => LockError::RecordMissing(self.resource.clone()),
            Err(e) => e.into(),
        };
        self.set_state(LockState::Invalid, None);
        Err(err)
    }

    fn set_state(&self, state: LockState, held: Option<LockRecord>) {
        let mut shared = self.shared();
        shared.state = state;
        shared.held = held;
    }

    /// Log and emit any failure before handing it back to the caller
    fn report<V>(&self, result: Result<V, LockError>) -> Result<V, LockError> {
        if let Err(e) = &result {
            tracing::warn!(resource = %self.resource, error = %e, "lock operation failed");
            self.events.emit(LockEvent::Error {
                message: e.to_string(),
            });
        }
        result
    }

    fn table(&self) -> &T {
        self.collection.table()
    }

    fn update_options(&self) -> UpdateOptions {
        UpdateOptions::new(self.collection.config().write_concern)
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Lease timer callback bound to one arming of the timers
#[derive(Clone)]
struct LeaseCallback {
    shared: Arc<Mutex<Shared>>,
    events: EventEmitter,
    resource: ResourceKey,
    epoch: u64,
}

impl LeaseCallback {
    fn warn(self) {
        let record = {
            let shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
            if shared.lease_epoch != self.epoch {
                return;
            }
            shared.held.clone()
        };
        if let Some(record) = record {
            tracing::warn!(resource = %self.resource, "lock lease expires soon");
            self.events.emit(LockEvent::ExpiresSoon(record));
        }
    }

    fn expire(self) {
        let record = {
            let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
            if shared.lease_epoch != self.epoch || !matches!(shared.state, LockState::Held(_)) {
                return;
            }
            shared.state = LockState::Expired;
            shared.held.take()
        };
        if let Some(record) = record {
            tracing::warn!(resource = %self.resource, "lock lease expired");
            self.events.emit(LockEvent::Expired(record));
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
