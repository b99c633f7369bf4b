use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

struct Snapshot<T> {
    value: Arc<T>,
    built_at: Instant,
}

/// A single cached value that expires `ttl` after it was built.
///
/// Readers share the snapshot through an `Arc`; a rebuild never blocks them
/// because the value is produced outside the lock and swapped in afterwards.
/// Concurrent rebuilds are allowed and the last writer wins. A zero TTL
/// disables caching entirely.
pub struct SnapshotStore<T> {
    ttl: Duration,
    slot: RwLock<Option<Snapshot<T>>>,
}

impl<T> SnapshotStore<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value if it is younger than the TTL.
    pub fn get_fresh(&self) -> Option<Arc<T>> {
        self.get_fresh_at(Instant::now())
    }

    pub fn get_fresh_at(&self, now: Instant) -> Option<Arc<T>> {
        let guard = rw_read(&self.slot, SOURCE, "get_fresh");
        let snapshot = guard.as_ref()?;
        let age = now.saturating_duration_since(snapshot.built_at);
        (age < self.ttl).then(|| Arc::clone(&snapshot.value))
    }

    /// Publish `value` as the current snapshot, built at `built_at`.
    pub fn store_at(&self, value: T, built_at: Instant) -> Arc<T> {
        let value = Arc::new(value);
        *rw_write(&self.slot, SOURCE, "store") = Some(Snapshot {
            value: Arc::clone(&value),
            built_at,
        });
        value
    }

    /// Drop the snapshot so the next read rebuilds it.
    pub fn invalidate(&self) {
        *rw_write(&self.slot, SOURCE, "invalidate") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_no_fresh_value() {
        let store: SnapshotStore<u32> = SnapshotStore::new(Duration::from_secs(60));
        assert!(store.get_fresh().is_none());
    }

    #[test]
    fn value_expires_after_ttl() {
        let store = SnapshotStore::new(Duration::from_secs(5));
        let built = Instant::now();
        store.store_at(7_u32, built);

        assert_eq!(store.get_fresh_at(built).as_deref(), Some(&7));
        assert_eq!(
            store
                .get_fresh_at(built + Duration::from_secs(4))
                .as_deref(),
            Some(&7)
        );
        assert!(store.get_fresh_at(built + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn readers_share_the_stored_snapshot() {
        let store = SnapshotStore::new(Duration::from_secs(60));
        let stored = store.store_at(vec![1, 2, 3], Instant::now());
        let read = store.get_fresh().expect("fresh");
        assert!(Arc::ptr_eq(&stored, &read));
    }

    #[test]
    fn last_writer_wins() {
        let store = SnapshotStore::new(Duration::from_secs(60));
        let now = Instant::now();
        store.store_at("old", now);
        store.store_at("new", now);
        assert_eq!(store.get_fresh().as_deref(), Some(&"new"));
    }

    #[test]
    fn invalidate_drops_the_snapshot() {
        let store = SnapshotStore::new(Duration::from_secs(60));
        store.store_at(1_u8, Instant::now());
        store.invalidate();
        assert!(store.get_fresh().is_none());
    }

    #[test]
    fn zero_ttl_never_serves_a_snapshot() {
        let store = SnapshotStore::new(Duration::ZERO);
        let now = Instant::now();
        store.store_at((), now);
        assert!(store.get_fresh_at(now).is_none());
    }
}
