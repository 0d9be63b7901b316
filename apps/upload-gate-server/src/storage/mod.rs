//! Storage module for multipart-capable object stores
//!
//! The upload core depends only on [`StorageBackend`]. `S3Backend` talks to
//! MinIO, Cloudflare R2, Backblaze B2 and AWS S3; `MemoryBackend` emulates the
//! same multipart semantics in-process.

mod memory;
mod s3;
mod types;

pub use memory::MemoryBackend;
pub use s3::S3Backend;
pub use types::*;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::error::Result;

/// Narrow multipart object-store capability
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Start a multipart upload for `key`. The backend mints the upload id.
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<MultipartHandle>;

    /// Rebind to an upload started earlier. No backend round trip; an unknown
    /// id surfaces on the next operation.
    fn resume_multipart_upload(&self, key: &str, upload_id: &str) -> MultipartHandle {
        MultipartHandle {
            key: key.to_string(),
            upload_id: upload_id.to_string(),
        }
    }

    async fn upload_part(&self, handle: &MultipartHandle, part_number: u32, body: Bytes) -> Result<PartRecord>;

    /// Assemble the object from `parts`, passed through verbatim
    async fn complete(&self, handle: &MultipartHandle, parts: &[PartRecord]) -> Result<CompletedObject>;

    async fn abort(&self, handle: &MultipartHandle) -> Result<()>;

    /// Object metadata, or `None` if the object does not exist
    async fn head(&self, key: &str) -> Result<Option<ObjectMetadata>>;

    async fn get(&self, key: &str) -> Result<Option<StorageObject>>;

    async fn delete(&self, key: &str) -> Result<()>;
}
