//! Upload progress tracking
//!
//! The progress store is the single source of truth for how many bytes of an
//! upload have been acknowledged. It also remembers how a session ended:
//! completion and abort move the entry to a terminal status, after which its
//! byte count is never read again.

mod locks;
mod memory;

pub use locks::{UploadGuard, UploadLocks};
pub use memory::MemoryProgressStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::upload::SessionStatus;

/// Durable `upload_id -> (uploaded bytes, status)` mapping
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Bytes acknowledged so far, or `None` unless the session is active
    async fn get(&self, upload_id: &str) -> Result<Option<u64>>;

    /// Set the counter and mark the session active, creating the entry if needed
    async fn put(&self, upload_id: &str, uploaded_bytes: u64) -> Result<()>;

    /// Compare-and-swap: set to `uploaded_bytes` only if the session is active
    /// and the current value is `expected`. Returns `false` otherwise.
    async fn put_if(&self, upload_id: &str, expected: u64, uploaded_bytes: u64) -> Result<bool>;

    /// Move the session to a terminal status. Returns whether it was active.
    async fn finish(&self, upload_id: &str, status: SessionStatus) -> Result<bool>;

    /// Current status, or `None` for an id the store has never seen
    async fn status(&self, upload_id: &str) -> Result<Option<SessionStatus>>;

    /// Remove the entry entirely. Returns whether one existed.
    async fn delete(&self, upload_id: &str) -> Result<bool>;
}
