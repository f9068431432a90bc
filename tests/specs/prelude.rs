//! Shared fixtures for behavioral specs

pub use gridlock_adapters::{MemoryStore, MemoryTable, TracedTable};
pub use gridlock_core::{
    Clock, CollectionConfig, Expiry, FakeClock, LockEvent, LockKind, LockOptions, LockRecord,
};
pub use gridlock_engine::{
    Acquisition, EventReceiver, Lock, LockCollection, LockError, LockState, LockStateError,
    WriteLockOptions,
};
pub use std::time::Duration;

pub type Table = TracedTable<MemoryTable>;
pub type SpecLock = Lock<Table, FakeClock>;

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// A store, a frozen clock, and a ready collection on top of them
pub struct World {
    pub store: MemoryStore,
    pub clock: FakeClock,
    pub collection: LockCollection<Table, FakeClock>,
}

impl World {
    pub async fn new() -> Self {
        Self::with_config(CollectionConfig::default().with_polling_interval(ms(100))).await
    }

    pub async fn with_config(config: CollectionConfig) -> Self {
        let store = MemoryStore::new();
        let clock = FakeClock::new();
        let table = TracedTable::new(store.table(&config.table_name()));
        let collection = LockCollection::with_clock(table, config, clock.clone())
            .await
            .unwrap();
        Self {
            store,
            clock,
            collection,
        }
    }

    pub fn lock(&self, resource: &str, options: LockOptions) -> SpecLock {
        Lock::new(resource, &self.collection, options).unwrap()
    }

    pub fn table(&self) -> MemoryTable {
        self.store.table(&self.collection.config().table_name())
    }

    pub fn record(&self, resource: &str) -> LockRecord {
        self.table().find(resource).unwrap()
    }

    /// Deadline `lease` after the frozen clock's current time
    pub fn expiry_in(&self, lease: Duration) -> Expiry {
        Expiry::after(self.clock.now(), Some(lease))
    }
}

/// Wait until an event with the given name arrives, skipping others
pub async fn wait_for(rx: &mut EventReceiver, name: &str) -> LockEvent {
    loop {
        let event = rx.recv().await.expect("event channel closed");
        if event.name() == name {
            return event;
        }
    }
}

/// Names of all events already delivered
pub fn drain(rx: &mut EventReceiver) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    names
}
