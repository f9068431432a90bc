// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conditional updates that make up the lock protocol
//!
//! Every lock transition is one atomic conditional mutation on the record.
//! These builders are pure: given the resource and the caller's current
//! time they return the filter and mutation to send to the store.

use chrono::{DateTime, Utc};
use gridlock_core::{Condition, Expiry, Filter, LockKind, Mutation, ResourceKey, Update};
use std::time::Duration;

/// Inputs shared by the acquisition builders
#[derive(Clone, Debug)]
pub struct Claim<'a> {
    pub resource: &'a ResourceKey,
    pub now: DateTime<Utc>,
    pub lease: Option<Duration>,
    pub polling_interval: Duration,
    pub metadata: Option<&'a serde_json::Value>,
}

/// Oldest deadline a writer may leave behind before readers override it
///
/// Two polling cycles of margin absorb clock skew and latency between hosts.
pub fn stale_writer_cutoff(now: DateTime<Utc>, polling_interval: Duration) -> DateTime<Utc> {
    polling_interval
        .checked_mul(2)
        .and_then(|margin| chrono::Duration::from_std(margin).ok())
        .and_then(|margin| now.checked_sub_signed(margin))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Grant a shared lock when no writer holds or waits, or the writer is stale
pub fn read_claim(claim: &Claim<'_>) -> (Filter, Mutation) {
    let filter = Filter::resource(claim.resource.clone()).when(Condition::Any(vec![
        Condition::All(vec![Condition::WriteLock(false), Condition::WriteReq(false)]),
        Condition::All(vec![
            Condition::WriteLock(true),
            Condition::ExpiresBefore(stale_writer_cutoff(claim.now, claim.polling_interval)),
        ]),
    ]));

    let mutation = Mutation::new()
        .with(Update::IncReadLocks)
        .with(Update::IncReads)
        .with(Update::SetWriteLock(false))
        .with(Update::SetWriteReq(false))
        .with(Update::RaiseExpires(Expiry::after(claim.now, claim.lease)))
        .with(Update::SetMeta(claim.metadata.cloned()));

    (filter, mutation)
}

/// Grant an exclusive lock when the record is idle, or when a waiting
/// writer finds the current holder's lease lapsed
pub fn write_claim(claim: &Claim<'_>) -> (Filter, Mutation) {
    let filter = Filter::resource(claim.resource.clone()).when(Condition::Any(vec![
        Condition::All(vec![
            Condition::ExpiresBefore(claim.now),
            Condition::WriteReq(true),
        ]),
        Condition::All(vec![Condition::WriteLock(false), Condition::ReadLocksEq(0)]),
    ]));

    let mutation = Mutation::new()
        .with(Update::SetWriteLock(true))
        .with(Update::SetWriteReq(false))
        .with(Update::SetReadLocks(0))
        .with(Update::SetExpires(Expiry::after(claim.now, claim.lease)))
        .with(Update::IncWrites)
        .with(Update::SetMeta(claim.metadata.cloned()));

    (filter, mutation)
}

/// Flag a waiting writer; matches only while the flag is clear
pub fn write_request(resource: &ResourceKey) -> (Filter, Mutation) {
    let filter = Filter::resource(resource.clone()).when(Condition::WriteReq(false));
    let mutation = Mutation::new().with(Update::SetWriteReq(true));
    (filter, mutation)
}

/// Withdraw the writer flag after a timed-out wait
pub fn withdraw_write_request(resource: &ResourceKey) -> (Filter, Mutation) {
    let filter = Filter::resource(resource.clone()).when(Condition::WriteReq(true));
    let mutation = Mutation::new().with(Update::SetWriteReq(false));
    (filter, mutation)
}

/// Push the deadline out; a sibling's later deadline is kept
pub fn renewal(
    resource: &ResourceKey,
    now: DateTime<Utc>,
    lease: Option<Duration>,
) -> (Filter, Mutation) {
    let filter = Filter::resource(resource.clone());
    let mutation = Mutation::new().with(Update::RaiseExpires(Expiry::after(now, lease)));
    (filter, mutation)
}

pub fn release(resource: &ResourceKey, kind: LockKind, now: DateTime<Utc>) -> (Filter, Mutation) {
    match kind {
        LockKind::Shared => (
            Filter::resource(resource.clone()).when(Condition::ReadLocksAbove(0)),
            Mutation::new()
                .with(Update::DecReadLocks)
                .with(Update::SetMeta(None)),
        ),
        LockKind::Exclusive => (
            Filter::resource(resource.clone()).when(Condition::WriteLock(true)),
            Mutation::new()
                .with(Update::SetWriteLock(false))
                .with(Update::SetMeta(None))
                .with(Update::SetExpires(Expiry::At(now))),
        ),
    }
}

/// Reset the deadline of an idle record so a long lease does not linger
///
/// Not atomic with the release that precedes it; a reader slipping in
/// between may briefly inherit the old deadline.
pub fn settle_idle(resource: &ResourceKey, now: DateTime<Utc>) -> (Filter, Mutation) {
    let filter = Filter::resource(resource.clone()).when(Condition::All(vec![
        Condition::ReadLocksEq(0),
        Condition::WriteLock(false),
    ]));
    let mutation = Mutation::new().with(Update::SetExpires(Expiry::At(now)));
    (filter, mutation)
}

pub fn removal(resource: &ResourceKey) -> Filter {
    Filter::resource(resource.clone()).when(Condition::WriteLock(true))
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
