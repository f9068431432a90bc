//! Mutual exclusion specs
//!
//! Verify exclusive grants exclude everyone and shared grants coexist.

use crate::prelude::*;

#[tokio::test]
async fn writer_excludes_other_writers_and_readers() {
    let world = World::new().await;
    let mut owner = world.lock("doc", LockOptions::new());
    let mut rival = world.lock("doc", LockOptions::new());
    let mut reader = world.lock("doc", LockOptions::new());

    assert!(owner.obtain_write_lock().await.unwrap().is_locked());

    assert_eq!(rival.obtain_write_lock().await.unwrap(), Acquisition::TimedOut);
    assert_eq!(reader.obtain_read_lock().await.unwrap(), Acquisition::TimedOut);

    let record = world.record("doc");
    assert!(record.write_lock);
    assert_eq!(record.read_locks, 0);
    assert_eq!(record.writes, 1);
}

#[tokio::test]
async fn released_writer_hands_over() {
    let world = World::new().await;
    let mut owner = world.lock("doc", LockOptions::new());
    let mut next = world.lock("doc", LockOptions::new());

    owner.obtain_write_lock().await.unwrap();
    owner.release_lock().await.unwrap();

    assert!(next.obtain_write_lock().await.unwrap().is_locked());
    assert_eq!(world.record("doc").writes, 2);
}

#[tokio::test]
async fn readers_share_the_lock() {
    let world = World::new().await;
    let mut readers: Vec<SpecLock> = (0..3)
        .map(|_| world.lock("doc", LockOptions::new()))
        .collect();

    for reader in &mut readers {
        assert!(reader.obtain_read_lock().await.unwrap().is_locked());
    }
    assert_eq!(world.record("doc").read_locks, 3);

    let record = readers[0].release_lock().await.unwrap();
    assert_eq!(record.read_locks, 2);
    assert_eq!(world.record("doc").reads, 3);
}

#[tokio::test]
async fn readers_exclude_writers_until_all_release() {
    let world = World::new().await;
    let mut first = world.lock("doc", LockOptions::new());
    let mut second = world.lock("doc", LockOptions::new());
    let mut writer = world.lock("doc", LockOptions::new());

    first.obtain_read_lock().await.unwrap();
    second.obtain_read_lock().await.unwrap();

    first.release_lock().await.unwrap();
    assert_eq!(writer.obtain_write_lock().await.unwrap(), Acquisition::TimedOut);

    second.release_lock().await.unwrap();
    assert!(writer.obtain_write_lock().await.unwrap().is_locked());
}

#[tokio::test]
async fn resources_are_independent() {
    let world = World::new().await;
    let mut a = world.lock("a", LockOptions::new());
    let mut b = world.lock("b", LockOptions::new());

    assert!(a.obtain_write_lock().await.unwrap().is_locked());
    assert!(b.obtain_write_lock().await.unwrap().is_locked());
    assert_eq!(world.table().records().len(), 2);
}
