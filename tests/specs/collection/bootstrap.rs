//! Collection bootstrap specs
//!
//! Verify collection setup and first-access races on a fresh resource.

use crate::prelude::*;

#[tokio::test]
async fn concurrent_first_readers_share_one_record() {
    let world = World::new().await;
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mut lock = world.lock("fresh", LockOptions::new().with_timeout(secs(5)));
            tokio::spawn(async move {
                let outcome = lock.obtain_read_lock().await.unwrap();
                (lock, outcome)
            })
        })
        .collect();

    let mut holders = Vec::new();
    for handle in handles {
        let (lock, outcome) = handle.await.unwrap();
        assert!(outcome.is_locked());
        holders.push(lock);
    }

    let records = world.table().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].read_locks, 8);
    assert_eq!(records[0].reads, 8);
}

#[tokio::test]
async fn concurrent_first_writers_admit_exactly_one() {
    let world = World::new().await;
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mut lock = world.lock("fresh", LockOptions::new());
            tokio::spawn(async move {
                let outcome = lock.obtain_write_lock().await.unwrap();
                (lock, outcome)
            })
        })
        .collect();

    let mut granted = 0;
    let mut holders = Vec::new();
    for handle in handles {
        let (lock, outcome) = handle.await.unwrap();
        if outcome.is_locked() {
            granted += 1;
        }
        holders.push(lock);
    }

    assert_eq!(granted, 1);
    assert_eq!(world.table().records().len(), 1);
}

#[tokio::test]
async fn collections_share_a_table_idempotently() {
    let world = World::new().await;
    let again = LockCollection::with_clock(
        TracedTable::new(world.table()),
        world.collection.config().clone(),
        world.clock.clone(),
    )
    .await;

    assert!(again.is_ok());
    assert!(world.table().has_unique_key());
    assert_eq!(world.store.table_names(), vec!["fs.locks".to_string()]);
}

#[tokio::test]
async fn invalid_config_is_reported_as_error() {
    let store = MemoryStore::new();
    let config = CollectionConfig::new("bad$name");

    let result = LockCollection::create(TracedTable::new(store.table("bad$name.locks")), config).await;

    assert!(matches!(result, Err(LockError::Config(_))));
    assert!(!store.table("bad$name.locks").has_unique_key());
}

#[tokio::test]
async fn toml_config_drives_lock_defaults() {
    let config = CollectionConfig::from_toml(
        r#"
        namespace = "media"
        polling_interval = "250ms"
        lease_duration = "30s"
        timeout = "2s"
        "#,
    )
    .unwrap();
    let world = World::with_config(config).await;

    let lock = world.lock("doc", LockOptions::new());

    assert_eq!(lock.polling_interval(), ms(250));
    assert_eq!(lock.lease_duration(), Some(secs(30)));
    assert_eq!(lock.timeout(), secs(2));
    assert_eq!(world.store.table_names(), vec!["media.locks".to_string()]);
}
