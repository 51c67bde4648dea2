//! Per-key async locks
//!
//! Engines take the lock for an entity id before a read-modify-write cycle so
//! mutations on the same entity are mutually exclusive. Locks are created on
//! first use and kept for the life of the map; the population is bounded by
//! the number of distinct entity ids seen.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per entity id
pub struct LockMap {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LockMap {
    /// Create an empty lock map
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for `id`, waiting if another holder is active
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        // Clone the Arc out of the map before awaiting so the shard guard is
        // not held across the suspension point.
        let lock = self.locks.entry(id).or_default().clone();
        lock.lock_owned().await
    }
}

impl Default for LockMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(LockMap::new());
        let id = Uuid::now_v7();
        let in_flight = Arc::new(AtomicU64::new(0));
        let max_seen = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = LockMap::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let _guard_a = locks.acquire(a).await;
        // Must not deadlock while `a` is held.
        let _guard_b = locks.acquire(b).await;
    }
}
