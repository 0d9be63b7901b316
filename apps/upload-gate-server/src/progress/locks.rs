//! Per-upload mutual exclusion
//!
//! Serializes part uploads for the same upload id inside one process. Entries
//! are dropped from the table once nobody holds or awaits them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct UploadLocks {
    inner: Arc<Mutex<HashMap<String, Slot>>>,
}

/// One table entry; `users` counts holders plus waiters
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    users: usize,
}

/// Interest in a slot. Dropping it releases the slot even if the lock was
/// never obtained, so a cancelled waiter cannot leave an entry behind.
struct Registration {
    key: String,
    locks: UploadLocks,
}

/// Held for the duration of one part upload
pub struct UploadGuard {
    // Field order matters: the mutex is released before the slot is
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl UploadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, upload_id: &str) -> UploadGuard {
        let (mutex, registration) = self.register(upload_id);
        let guard = mutex.lock_owned().await;

        UploadGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    fn register(&self, upload_id: &str) -> (Arc<AsyncMutex<()>>, Registration) {
        let mut table = self.inner.lock();
        let slot = table.entry(upload_id.to_string()).or_insert_with(|| Slot {
            mutex: Arc::new(AsyncMutex::new(())),
            users: 0,
        });
        slot.users += 1;

        let registration = Registration {
            key: upload_id.to_string(),
            locks: self.clone(),
        };
        (slot.mutex.clone(), registration)
    }

    /// Number of upload ids currently held or awaited
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut table = self.locks.inner.lock();
        if let Some(slot) = table.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                table.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = UploadLocks::new();
        let first = locks.acquire("a").await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.acquire("a").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = UploadLocks::new();
        let _a = locks.acquire("a").await;
        let _b = locks.acquire("b").await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_slot() {
        let locks = UploadLocks::new();
        let holder = locks.acquire("a").await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.acquire("a").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        waiter.abort();
        let _ = waiter.await;
        assert_eq!(locks.len(), 1);

        drop(holder);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_cancelled_after_holder_leaves() {
        let locks = UploadLocks::new();
        let holder = locks.acquire("a").await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.acquire("a").await;
            std::future::pending::<()>().await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(holder);
        assert_eq!(locks.len(), 1);

        waiter.abort();
        let _ = waiter.await;
        assert!(locks.is_empty());
    }
}
