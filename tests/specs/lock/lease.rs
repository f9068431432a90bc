//! Lease specs
//!
//! Verify deadlines only move forward, local expiry is signalled, and stale
//! holders are overridden by the next acquirer.

use crate::prelude::*;

#[tokio::test]
async fn shorter_lease_never_lowers_deadline() {
    let world = World::new().await;
    let mut long = world.lock("doc", LockOptions::new().with_lease_duration(secs(60)));
    let mut short = world.lock("doc", LockOptions::new().with_lease_duration(secs(10)));

    long.obtain_read_lock().await.unwrap();
    let long_deadline = world.expiry_in(secs(60));
    short.obtain_read_lock().await.unwrap();
    assert_eq!(world.record("doc").expires, long_deadline);

    let renewed = short.renew_lock().await.unwrap();
    assert_eq!(renewed.expires, long_deadline);
}

#[tokio::test]
async fn renewals_move_deadline_forward() {
    let world = World::new().await;
    let mut lock = world.lock("doc", LockOptions::new().with_lease_duration(secs(30)));
    lock.obtain_write_lock().await.unwrap();

    let mut previous = world.record("doc").expires;
    for _ in 0..3 {
        world.clock.advance(secs(10));
        let record = lock.renew_lock().await.unwrap();
        assert!(record.expires > previous);
        assert_eq!(record.expires, world.expiry_in(secs(30)));
        previous = record.expires;
    }
}

#[tokio::test(start_paused = true)]
async fn held_lock_signals_expiry() {
    let world = World::new().await;
    let mut lock = world.lock("doc", LockOptions::new().with_lease_duration(ms(1000)));
    let mut events = lock.subscribe();
    let started = tokio::time::Instant::now();

    lock.obtain_write_lock().await.unwrap();

    wait_for(&mut events, "expires-soon").await;
    assert!(started.elapsed() >= ms(900) && started.elapsed() < ms(1000));
    assert_eq!(lock.state(), LockState::Held(LockKind::Exclusive));

    let expired = wait_for(&mut events, "expired").await;
    assert!(started.elapsed() >= ms(1000) && started.elapsed() < ms(1100));
    assert!(expired.record().unwrap().write_lock);
    assert!(lock.is_expired());

    let release = lock.release_lock().await.unwrap_err();
    assert_eq!(release.state(), Some(LockStateError::Expired));
    let renew = lock.renew_lock().await.unwrap_err();
    assert_eq!(renew.state(), Some(LockStateError::Expired));
}

#[tokio::test]
async fn reader_overrides_writer_stale_past_two_polling_intervals() {
    let world = World::new().await;
    let mut crashed = world.lock("doc", LockOptions::new().with_lease_duration(secs(1)));
    let mut reader = world.lock("doc", LockOptions::new());

    crashed.obtain_write_lock().await.unwrap();

    // Lapsed, but within the two-interval margin
    world.clock.advance(ms(1150));
    assert_eq!(reader.obtain_read_lock().await.unwrap(), Acquisition::TimedOut);

    world.clock.advance(ms(100));
    let record = reader.obtain_read_lock().await.unwrap();
    let record = record.record().unwrap();
    assert!(!record.write_lock);
    assert_eq!(record.read_locks, 1);
}

#[tokio::test(start_paused = true)]
async fn waiting_writer_reclaims_expired_record() {
    let world = World::new().await;
    let mut crashed = world.lock("doc", LockOptions::new().with_lease_duration(secs(5)));
    let mut writer = world.lock("doc", LockOptions::new().with_timeout(secs(1)));

    crashed.obtain_read_lock().await.unwrap();
    world.clock.advance(secs(6));

    let outcome = writer.obtain_write_lock().await.unwrap();

    let record = outcome.record().unwrap();
    assert!(record.write_lock);
    assert_eq!(record.read_locks, 0);
    assert!(!record.write_req);
}

#[tokio::test]
async fn writer_without_request_does_not_reclaim() {
    let world = World::new().await;
    let mut crashed = world.lock("doc", LockOptions::new().with_lease_duration(secs(5)));
    let mut writer = world.lock("doc", LockOptions::new());

    crashed.obtain_read_lock().await.unwrap();
    world.clock.advance(secs(6));

    assert_eq!(writer.obtain_write_lock().await.unwrap(), Acquisition::TimedOut);
}
