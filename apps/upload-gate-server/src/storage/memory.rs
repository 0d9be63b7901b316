//! In-memory storage backend
//!
//! Emulates S3 multipart semantics: the backend mints upload ids, rejects
//! operations on unknown or finished uploads, and assembles parts in the order
//! the completion request names them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, StorageError};

use super::types::{CompletedObject, MultipartHandle, ObjectMetadata, PartRecord, StorageObject};
use super::StorageBackend;

#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryBackendInner>,
}

#[derive(Default)]
struct MemoryBackendInner {
    objects: RwLock<HashMap<String, StoredObject>>,
    uploads: RwLock<HashMap<String, PendingUpload>>,
}

struct StoredObject {
    data: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

struct PendingUpload {
    key: String,
    content_type: String,
    parts: BTreeMap<u32, (String, Bytes)>,
}

fn etag_of(data: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(data));
    format!("\"{}\"", &digest[..32])
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly, bypassing the multipart flow
    pub async fn put_object(&self, key: &str, content_type: &str, data: impl Into<Bytes>) {
        let data = data.into();
        let object = StoredObject {
            etag: etag_of(&data),
            data,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
        };
        self.inner.objects.write().await.insert(key.to_string(), object);
    }

    /// Number of parts held for an in-progress upload
    pub async fn part_count(&self, upload_id: &str) -> Option<usize> {
        self.inner
            .uploads
            .read()
            .await
            .get(upload_id)
            .map(|upload| upload.parts.len())
    }

    pub async fn active_uploads(&self) -> usize {
        self.inner.uploads.read().await.len()
    }

    fn metadata(key: &str, object: &StoredObject) -> ObjectMetadata {
        ObjectMetadata {
            key: key.to_string(),
            size: object.data.len() as u64,
            last_modified: Some(object.last_modified),
            content_type: Some(object.content_type.clone()),
            etag: Some(object.etag.clone()),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<MultipartHandle> {
        let upload_id = Uuid::new_v4().to_string();

        self.inner.uploads.write().await.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                content_type: content_type.to_string(),
                parts: BTreeMap::new(),
            },
        );

        Ok(MultipartHandle {
            key: key.to_string(),
            upload_id,
        })
    }

    async fn upload_part(&self, handle: &MultipartHandle, part_number: u32, body: Bytes) -> Result<PartRecord> {
        let mut uploads = self.inner.uploads.write().await;
        let upload = uploads
            .get_mut(&handle.upload_id)
            .filter(|upload| upload.key == handle.key)
            .ok_or_else(|| StorageError::NoSuchUpload(handle.upload_id.clone()))?;

        let etag = etag_of(&body);
        upload.parts.insert(part_number, (etag.clone(), body));

        Ok(PartRecord { part_number, etag })
    }

    async fn complete(&self, handle: &MultipartHandle, parts: &[PartRecord]) -> Result<CompletedObject> {
        let mut uploads = self.inner.uploads.write().await;
        let upload = uploads
            .get(&handle.upload_id)
            .filter(|upload| upload.key == handle.key)
            .ok_or_else(|| StorageError::NoSuchUpload(handle.upload_id.clone()))?;

        if parts.is_empty() {
            return Err(StorageError::InvalidPart("no parts given".to_string()).into());
        }

        let mut data = Vec::new();
        let mut previous = 0;
        for part in parts {
            if part.part_number <= previous {
                return Err(StorageError::InvalidPart(format!(
                    "part {} is out of order",
                    part.part_number
                ))
                .into());
            }
            previous = part.part_number;

            match upload.parts.get(&part.part_number) {
                Some((etag, bytes)) if *etag == part.etag => data.extend_from_slice(bytes),
                _ => {
                    return Err(StorageError::InvalidPart(format!(
                        "part {} does not match an uploaded part",
                        part.part_number
                    ))
                    .into())
                }
            }
        }

        let content_type = upload.content_type.clone();
        uploads.remove(&handle.upload_id);
        drop(uploads);

        let digest = hex::encode(Sha256::digest(&data));
        let etag = format!("\"{}-{}\"", &digest[..32], parts.len());
        let size = data.len() as u64;

        self.inner.objects.write().await.insert(
            handle.key.clone(),
            StoredObject {
                data: Bytes::from(data),
                content_type,
                etag: etag.clone(),
                last_modified: Utc::now(),
            },
        );

        Ok(CompletedObject { etag, size })
    }

    async fn abort(&self, handle: &MultipartHandle) -> Result<()> {
        let mut uploads = self.inner.uploads.write().await;
        match uploads.get(&handle.upload_id) {
            Some(upload) if upload.key == handle.key => {
                uploads.remove(&handle.upload_id);
                Ok(())
            }
            _ => Err(StorageError::NoSuchUpload(handle.upload_id.clone()).into()),
        }
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMetadata>> {
        let objects = self.inner.objects.read().await;
        Ok(objects.get(key).map(|object| Self::metadata(key, object)))
    }

    async fn get(&self, key: &str) -> Result<Option<StorageObject>> {
        let objects = self.inner.objects.read().await;
        Ok(objects.get(key).map(|object| StorageObject {
            metadata: Self::metadata(key, object),
            data: object.data.clone(),
        }))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.objects.write().await.remove(key);
        Ok(())
    }
}
