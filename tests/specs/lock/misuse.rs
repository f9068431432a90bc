//! Illegal operation specs
//!
//! Verify protocol misuse is rejected without touching the store.

use crate::prelude::*;

#[tokio::test]
async fn unheld_handle_rejects_held_operations() {
    let world = World::new().await;
    let mut bystander = world.lock("doc", LockOptions::new());
    let mut lock = world.lock("doc", LockOptions::new());
    bystander.obtain_read_lock().await.unwrap();
    let before = world.table().records();
    let mut events = lock.subscribe();

    let renew = lock.renew_lock().await.unwrap_err();
    let release = lock.release_lock().await.unwrap_err();
    let remove = lock.remove_lock().await.unwrap_err();

    assert_eq!(renew.state(), Some(LockStateError::NotHeld));
    assert_eq!(release.state(), Some(LockStateError::NotHeld));
    assert_eq!(remove.state(), Some(LockStateError::NotHeld));
    assert_eq!(world.table().records(), before);
    assert_eq!(drain(&mut events), vec!["error", "error", "error"]);
}

#[tokio::test]
async fn held_handle_rejects_second_obtain() {
    let world = World::new().await;
    let mut lock = world.lock("doc", LockOptions::new());
    lock.obtain_write_lock().await.unwrap();
    let before = world.table().records();

    let err = lock.obtain_read_lock().await.unwrap_err();

    assert_eq!(err.state(), Some(LockStateError::AlreadyHeld));
    assert_eq!(world.table().records(), before);
}

#[tokio::test]
async fn shared_holder_cannot_remove() {
    let world = World::new().await;
    let mut lock = world.lock("doc", LockOptions::new());
    lock.obtain_read_lock().await.unwrap();
    let before = world.table().records();

    let err = lock.remove_lock().await.unwrap_err();

    assert_eq!(err.state(), Some(LockStateError::SharedRemove));
    assert_eq!(world.table().records(), before);
    assert!(lock.release_lock().await.is_ok());
}

#[tokio::test]
async fn exclusive_holder_removes_record() {
    let world = World::new().await;
    let mut lock = world.lock("doc", LockOptions::new());
    lock.obtain_write_lock().await.unwrap();

    lock.remove_lock().await.unwrap();

    assert!(world.table().find("doc").is_none());
    assert_eq!(lock.state(), LockState::Unheld);
}

#[tokio::test]
async fn released_handle_rejects_release() {
    let world = World::new().await;
    let mut lock = world.lock("doc", LockOptions::new());
    lock.obtain_read_lock().await.unwrap();
    lock.release_lock().await.unwrap();

    let err = lock.release_lock().await.unwrap_err();

    assert_eq!(err.state(), Some(LockStateError::NotHeld));
    assert_eq!(world.record("doc").read_locks, 0);
}
