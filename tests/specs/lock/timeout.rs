//! Acquisition timeout specs
//!
//! Verify polling gives up on time and cleans up after itself.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn writer_times_out_within_one_polling_interval() {
    let world = World::new().await;
    let mut holder = world.lock("doc", LockOptions::new());
    let mut writer = world.lock(
        "doc",
        LockOptions::new()
            .with_timeout(ms(200))
            .with_polling_interval(ms(50)),
    );
    holder.obtain_read_lock().await.unwrap();
    let mut events = writer.subscribe();
    let started = tokio::time::Instant::now();

    let outcome = writer.obtain_write_lock().await.unwrap();

    assert_eq!(outcome, Acquisition::TimedOut);
    assert!(started.elapsed() >= ms(200));
    assert!(started.elapsed() <= ms(250));
    assert_eq!(drain(&mut events), vec!["write-req-set", "timed-out"]);
    assert!(!world.record("doc").write_req);
    assert_eq!(writer.state(), LockState::Unheld);
}

#[tokio::test(start_paused = true)]
async fn suppressed_cleanup_leaves_write_request() {
    let world = World::new().await;
    let mut holder = world.lock("doc", LockOptions::new());
    let mut writer = world.lock("doc", LockOptions::new().with_timeout(ms(200)));
    holder.obtain_read_lock().await.unwrap();

    let outcome = writer
        .obtain_write_lock_with(WriteLockOptions {
            keep_write_req_on_timeout: true,
        })
        .await
        .unwrap();

    assert_eq!(outcome, Acquisition::TimedOut);
    assert!(world.record("doc").write_req);
}

#[tokio::test(start_paused = true)]
async fn reader_times_out_behind_writer() {
    let world = World::new().await;
    let mut writer = world.lock("doc", LockOptions::new());
    let mut reader = world.lock("doc", LockOptions::new().with_timeout(ms(300)));
    writer.obtain_write_lock().await.unwrap();
    let mut events = reader.subscribe();
    let started = tokio::time::Instant::now();

    assert_eq!(reader.obtain_read_lock().await.unwrap(), Acquisition::TimedOut);

    assert!(started.elapsed() >= ms(300));
    assert_eq!(drain(&mut events), vec!["timed-out"]);
    assert_eq!(world.record("doc").reads, 0);
}

#[tokio::test(start_paused = true)]
async fn timed_out_handle_can_retry() {
    let world = World::new().await;
    let mut writer = world.lock("doc", LockOptions::new());
    let mut reader = world.lock("doc", LockOptions::new().with_timeout(ms(100)));
    writer.obtain_write_lock().await.unwrap();

    assert_eq!(reader.obtain_read_lock().await.unwrap(), Acquisition::TimedOut);
    writer.release_lock().await.unwrap();

    assert!(reader.obtain_read_lock().await.unwrap().is_locked());
}
