//! Synchronization primitives for Thinktrace.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// Per-key async mutex.
///
/// Different keys can be locked concurrently while operations on the same
/// key are serialized. Entries are dropped explicitly with [`release`]
/// once the caller no longer needs the key guarded.
///
/// # Example
///
/// ```ignore
/// let locks = KeyedLocks::new();
///
/// let lock = locks.get("session_01");
/// let _guard = lock.lock().await;
/// // Another `locks.get("session_01").lock().await` waits here.
/// ```
///
/// [`release`]: KeyedLocks::release
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Create a new empty lock collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for the given key.
    pub fn get(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the entry for `key` if nobody else holds or waits on it.
    ///
    /// Returns true if the entry was removed.
    pub fn release(&self, key: &str) -> bool {
        // strong_count == 1 means only the map holds it
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
    }

    /// Return the number of lock entries currently held.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Return true if there are no lock entries.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_same_lock_for_same_key() {
        let locks = KeyedLocks::new();

        let lock1 = locks.get("key1");
        let lock2 = locks.get("key1");

        assert!(Arc::ptr_eq(&lock1, &lock2));
    }

    #[test]
    fn get_returns_different_locks_for_different_keys() {
        let locks = KeyedLocks::new();

        let lock1 = locks.get("key1");
        let lock2 = locks.get("key2");

        assert!(!Arc::ptr_eq(&lock1, &lock2));
    }

    #[test]
    fn release_keeps_entries_still_referenced() {
        let locks = KeyedLocks::new();

        let held = locks.get("held");
        assert!(!locks.release("held"));
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.release("held"));
        assert!(locks.is_empty());
    }

    #[test]
    fn release_unknown_key_is_noop() {
        let locks = KeyedLocks::new();
        assert!(!locks.release("missing"));
    }

    #[tokio::test]
    async fn locks_serialize_same_key_access() {
        let locks = KeyedLocks::new();
        let lock = locks.get("key1");

        let guard = lock.try_lock();
        assert!(guard.is_ok());

        let lock2 = locks.get("key1");
        assert!(lock2.try_lock().is_err());
    }

    #[tokio::test]
    async fn different_keys_can_lock_concurrently() {
        let locks = KeyedLocks::new();

        let lock1 = locks.get("key1");
        let lock2 = locks.get("key2");

        let _guard1 = lock1.try_lock().unwrap();
        assert!(lock2.try_lock().is_ok());
    }
}
