//! In-process progress store (tests and `STORAGE_BACKEND=memory`)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ProgressStore;
use crate::error::Result;
use crate::upload::SessionStatus;

#[derive(Debug, Clone, Copy)]
struct Entry {
    uploaded_bytes: u64,
    status: SessionStatus,
}

#[derive(Clone, Default)]
pub struct MemoryProgressStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions still accepting parts
    pub async fn active_len(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.status == SessionStatus::Active)
            .count()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn get(&self, upload_id: &str) -> Result<Option<u64>> {
        Ok(self
            .entries
            .read()
            .await
            .get(upload_id)
            .filter(|entry| entry.status == SessionStatus::Active)
            .map(|entry| entry.uploaded_bytes))
    }

    async fn put(&self, upload_id: &str, uploaded_bytes: u64) -> Result<()> {
        self.entries.write().await.insert(
            upload_id.to_string(),
            Entry {
                uploaded_bytes,
                status: SessionStatus::Active,
            },
        );
        Ok(())
    }

    async fn put_if(&self, upload_id: &str, expected: u64, uploaded_bytes: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(upload_id) {
            Some(entry) if entry.status == SessionStatus::Active && entry.uploaded_bytes == expected => {
                entry.uploaded_bytes = uploaded_bytes;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn finish(&self, upload_id: &str, status: SessionStatus) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(upload_id.to_string()).or_insert(Entry {
            uploaded_bytes: 0,
            status,
        });
        let was_active = entry.status == SessionStatus::Active;
        if was_active {
            entry.status = status;
        }
        Ok(was_active)
    }

    async fn status(&self, upload_id: &str) -> Result<Option<SessionStatus>> {
        Ok(self.entries.read().await.get(upload_id).map(|entry| entry.status))
    }

    async fn delete(&self, upload_id: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(upload_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryProgressStore::new();
        assert_eq!(store.get("u").await.unwrap(), None);

        store.put("u", 0).await.unwrap();
        assert_eq!(store.get("u").await.unwrap(), Some(0));

        assert!(store.delete("u").await.unwrap());
        assert!(!store.delete("u").await.unwrap());
        assert_eq!(store.get("u").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_if_only_swaps_expected_value() {
        let store = MemoryProgressStore::new();
        assert!(!store.put_if("u", 0, 5).await.unwrap());

        store.put("u", 0).await.unwrap();
        assert!(store.put_if("u", 0, 5).await.unwrap());
        assert!(!store.put_if("u", 0, 10).await.unwrap());
        assert_eq!(store.get("u").await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_finished_session_is_terminal() {
        let store = MemoryProgressStore::new();
        store.put("u", 5).await.unwrap();

        assert!(store.finish("u", SessionStatus::Completed).await.unwrap());
        assert_eq!(store.get("u").await.unwrap(), None);
        assert!(!store.put_if("u", 5, 10).await.unwrap());
        assert_eq!(store.status("u").await.unwrap(), Some(SessionStatus::Completed));

        // A later abort does not rewrite the outcome
        assert!(!store.finish("u", SessionStatus::Aborted).await.unwrap());
        assert_eq!(store.status("u").await.unwrap(), Some(SessionStatus::Completed));
        assert_eq!(store.active_len().await, 0);
    }

    #[tokio::test]
    async fn test_finish_unknown_records_outcome() {
        let store = MemoryProgressStore::new();
        assert!(!store.finish("u", SessionStatus::Aborted).await.unwrap());
        assert_eq!(store.status("u").await.unwrap(), Some(SessionStatus::Aborted));
        assert_eq!(store.status("other").await.unwrap(), None);
    }
}
