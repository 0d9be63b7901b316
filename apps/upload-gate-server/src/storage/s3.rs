//! S3-compatible storage backend
//!
//! Wraps the AWS SDK for S3-compatible multipart uploads.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
    Client,
};
use axum::body::Bytes;
use chrono::DateTime;

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};

use super::types::{CompletedObject, MultipartHandle, ObjectMetadata, PartRecord, StorageObject};
use super::StorageBackend;

/// S3-compatible storage client
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
}

/// Map an SDK failure onto a storage error, keeping the service message
fn storage_error<E, R>(context: &str, target: &str, err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some("NoSuchKey") | Some("NotFound") => StorageError::ObjectNotFound(target.to_string()),
        Some("NoSuchUpload") => StorageError::NoSuchUpload(target.to_string()),
        Some("InvalidPart") | Some("InvalidPartOrder") | Some("EntityTooSmall") => {
            StorageError::InvalidPart(err.message().unwrap_or("rejected by backend").to_string())
        }
        _ => StorageError::SdkError(format!(
            "Failed to {} {}: {}",
            context,
            target,
            DisplayErrorContext(&err)
        )),
    }
}

fn to_datetime(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<chrono::Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

impl S3Backend {
    /// Create a new S3 backend from configuration
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "upload-gate",
        );

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        // Test connection by checking if bucket exists
        let bucket = config.bucket.clone();
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt operations anyway.",
                    bucket,
                    DisplayErrorContext(&e)
                );
            }
        }

        Ok(Self { client, bucket })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<MultipartHandle> {
        let response = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| storage_error("create multipart upload for", key, e))?;

        let upload_id = response.upload_id().ok_or_else(|| {
            StorageError::SdkError(format!("No upload id returned for {}", key))
        })?;

        Ok(MultipartHandle {
            key: key.to_string(),
            upload_id: upload_id.to_string(),
        })
    }

    async fn upload_part(&self, handle: &MultipartHandle, part_number: u32, body: Bytes) -> Result<PartRecord> {
        let part = i32::try_from(part_number)
            .map_err(|_| StorageError::InvalidPart(format!("Part number {} out of range", part_number)))?;

        let response = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&handle.key)
            .upload_id(&handle.upload_id)
            .part_number(part)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| storage_error("upload part to", &handle.upload_id, e))?;

        let etag = response.e_tag().ok_or_else(|| {
            StorageError::SdkError(format!("No etag returned for part {}", part_number))
        })?;

        Ok(PartRecord {
            part_number,
            etag: etag.to_string(),
        })
    }

    async fn complete(&self, handle: &MultipartHandle, parts: &[PartRecord]) -> Result<CompletedObject> {
        let completed_parts = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number as i32)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect::<Vec<_>>();

        let response = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&handle.key)
            .upload_id(&handle.upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed_parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| storage_error("complete multipart upload", &handle.upload_id, e))?;

        // The completion response carries no size
        let metadata = self
            .head(&handle.key)
            .await?
            .ok_or_else(|| StorageError::ObjectNotFound(handle.key.clone()))?;

        Ok(CompletedObject {
            etag: response
                .e_tag()
                .map(|s| s.to_string())
                .or(metadata.etag)
                .unwrap_or_default(),
            size: metadata.size,
        })
    }

    async fn abort(&self, handle: &MultipartHandle) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(&handle.key)
            .upload_id(&handle.upload_id)
            .send()
            .await
            .map_err(|e| storage_error("abort multipart upload", &handle.upload_id, e))?;

        Ok(())
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMetadata>> {
        let response = match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(response) => response,
            Err(e) if e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false) => {
                return Ok(None)
            }
            Err(e) => return Err(storage_error("head object", key, e).into()),
        };

        Ok(Some(ObjectMetadata {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0).max(0) as u64,
            last_modified: response.last_modified().and_then(to_datetime),
            content_type: response.content_type().map(|s| s.to_string()),
            etag: response.e_tag().map(|s| s.to_string()),
        }))
    }

    async fn get(&self, key: &str) -> Result<Option<StorageObject>> {
        let response = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(response) => response,
            Err(e) if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) => {
                return Ok(None)
            }
            Err(e) => return Err(storage_error("get object", key, e).into()),
        };

        let metadata = ObjectMetadata {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0).max(0) as u64,
            last_modified: response.last_modified().and_then(to_datetime),
            content_type: response.content_type().map(|s| s.to_string()),
            etag: response.e_tag().map(|s| s.to_string()),
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::SdkError(format!("Failed to read object body: {}", e)))?
            .into_bytes();

        Ok(Some(StorageObject { metadata, data }))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("delete object", key, e))?;

        Ok(())
    }
}
