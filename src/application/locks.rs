use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per account. Every operation that consumes an owner's
/// entries holds that owner's lock for its whole duration.
#[derive(Debug, Default)]
pub struct OwnerLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

pub type OwnerGuard = OwnedMutexGuard<()>;

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, owner: &str) -> OwnerGuard {
        // The map shard must not stay locked across the await below.
        let lock = self.locks.entry(owner.to_string()).or_default().clone();
        lock.lock_owned().await
    }

    /// Lock two owners in a fixed order so crossing calls cannot deadlock.
    /// Returns the guard for `first`, plus one for `second` when it differs.
    pub async fn acquire_pair(&self, first: &str, second: &str) -> (OwnerGuard, Option<OwnerGuard>) {
        if first == second {
            return (self.acquire(first).await, None);
        }
        if first < second {
            let a = self.acquire(first).await;
            let b = self.acquire(second).await;
            (a, Some(b))
        } else {
            let b = self.acquire(second).await;
            let a = self.acquire(first).await;
            (a, Some(b))
        }
    }

    #[cfg(test)]
    fn is_locked(&self, owner: &str) -> bool {
        self.locks
            .get(owner)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}
