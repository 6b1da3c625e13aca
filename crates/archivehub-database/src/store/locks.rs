//! In-process root locks for the memory store.
//!
//! Mirrors the advisory locks of the Postgres store: one mutex per key,
//! taken in sorted order and held until the owning transaction ends. A key
//! is removed from the registry once its last holder or waiter lets go.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use super::lock_order;

type Registry = DashMap<String, Arc<Mutex<()>>>;

/// Registry of per-key mutexes.
#[derive(Debug, Default)]
pub struct RootLocks {
    locks: Arc<Registry>,
}

/// Locks held by one transaction. Dropping it releases every key.
#[derive(Debug)]
pub struct RootLockGuard {
    keys: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
    registry: Arc<Registry>,
}

impl RootLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire every key in `keys`, waiting for each in sorted order.
    pub async fn acquire(&self, keys: &[String]) -> RootLockGuard {
        let keys = lock_order(keys);
        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let lock = self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }
        trace!(keys = ?keys, "Root locks acquired");

        RootLockGuard {
            keys,
            guards,
            registry: Arc::clone(&self.locks),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl RootLockGuard {
    /// The keys held, in acquisition order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Drop for RootLockGuard {
    fn drop(&mut self) {
        // Each owned guard holds a clone of its mutex; release them first so
        // the registry entry is the only reference left.
        self.guards.clear();
        for key in &self.keys {
            self.registry
                .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_keys_are_sorted_and_deduplicated() {
        let locks = RootLocks::new();
        let guard = locks.acquire(&keys(&["docs", "alice_bin", "docs"])).await;
        assert_eq!(guard.keys(), &["alice_bin".to_string(), "docs".to_string()]);
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_keys_leave_the_registry() {
        let locks = RootLocks::new();
        for i in 0..50 {
            let _guard = locks.acquire(&[format!("root-{i}")]).await;
        }
        assert!(locks.is_empty());

        let held = locks.acquire(&keys(&["docs"])).await;
        let other = locks.acquire(&keys(&["photos"])).await;
        drop(other);
        assert_eq!(locks.len(), 1);
        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_key_registered() {
        let locks = Arc::new(RootLocks::new());
        let guard = locks.acquire(&keys(&["docs"])).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(&keys(&["docs"])).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        // The waiter's clone keeps the entry alive past the first release.
        drop(guard);
        assert_eq!(locks.len(), 1);

        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_disjoint_keys_do_not_block() {
        let locks = RootLocks::new();
        let _docs = locks.acquire(&keys(&["docs"])).await;
        let photos =
            tokio::time::timeout(Duration::from_secs(1), locks.acquire(&keys(&["photos"]))).await;
        assert!(photos.is_ok());
    }
}
