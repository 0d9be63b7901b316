//! Multipart uploader

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Duration as TokenTtl;
use reqwest::{header, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::auth::{BackendAction, TokenIssuer};
use crate::storage::PartRecord;
use crate::upload::{
    CompleteUploadRequest, CompleteUploadResponse, CreateUploadRequest, CreateUploadResponse,
    PartUploadResponse,
};

use super::{ClientConfig, ClientError};

/// Lifetime of the backend tokens this client mints
const BACKEND_TOKEN_TTL_SECS: i64 = 60 * 60;

type Result<T> = std::result::Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Outcome of a finished upload
#[derive(Debug, Clone)]
pub struct UploadSummary {
    pub resource_name: String,
    pub file_url: String,
    pub etag: String,
    pub size: u64,
    pub file_size: u64,
    pub elapsed: Duration,
}

impl UploadSummary {
    /// Average throughput in MiB/s
    pub fn average_speed_mib(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.file_size as f64 / secs / (1024.0 * 1024.0)
    }
}

pub struct MultipartUploader {
    http: reqwest::Client,
    base_url: String,
    issuer: TokenIssuer,
}

impl MultipartUploader {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.worker_url.trim_end_matches('/').to_string(),
            issuer: TokenIssuer::new(&config.jwt_secret),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL of an uploaded resource
    pub fn file_url(&self, resource_name: &str) -> String {
        format!("{}/file/{}", self.base_url, urlencoding::encode(resource_name))
    }

    fn backend_token(&self, action: BackendAction) -> Result<String> {
        Ok(self
            .issuer
            .issue_backend_token(action, TokenTtl::seconds(BACKEND_TOKEN_TTL_SECS))?)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, token: &str) -> Result<T> {
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    pub async fn create_upload(
        &self,
        file_id: &str,
        file_size: u64,
        mime_type: &str,
    ) -> Result<CreateUploadResponse> {
        let token = self.backend_token(BackendAction::Create)?;
        let request = self
            .http
            .post(format!("{}/upload/create", self.base_url))
            .json(&CreateUploadRequest {
                id: file_id.to_string(),
                file_size,
                mime_type: mime_type.to_string(),
            });

        let created: CreateUploadResponse = self.send(request, &token).await?;
        tracing::info!(
            upload_id = %created.upload_id,
            total_parts = created.total_parts,
            "Upload created"
        );
        Ok(created)
    }

    /// Stream `path` in `chunkSize` parts using the client token from `created`
    pub async fn upload_parts(&self, path: &Path, created: &CreateUploadResponse) -> Result<Vec<PartRecord>> {
        let mut file = File::open(path).await?;
        let mut parts = Vec::new();

        for part_number in 1..=created.total_parts {
            let chunk = read_chunk(&mut file, created.chunk_size).await?;
            if chunk.is_empty() {
                break;
            }

            let part_number = u32::try_from(part_number).map_err(|_| ClientError::Api {
                status: 0,
                message: format!("Part number {} out of range", part_number),
            })?;
            let is_last = u64::from(part_number) == created.total_parts;

            tracing::debug!(part_number, bytes = chunk.len(), "Uploading part");

            let request = self
                .http
                .put(format!("{}/upload/part/{}", self.base_url, part_number))
                .query(&[("isLast", is_last)])
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(chunk);

            let part: PartUploadResponse = self.send(request, &created.client_token).await?;

            let percent = crate::upload::progress_percent(part.uploaded_bytes, part.total_bytes);
            tracing::info!(
                "Progress: {:.1}% ({}/{} bytes)",
                percent,
                part.uploaded_bytes,
                part.total_bytes
            );

            parts.push(PartRecord {
                part_number: part.part_number,
                etag: part.etag,
            });
        }

        Ok(parts)
    }

    pub async fn complete_upload(
        &self,
        upload_id: &str,
        file_id: &str,
        parts: Vec<PartRecord>,
    ) -> Result<CompleteUploadResponse> {
        let token = self.backend_token(BackendAction::Complete)?;
        let request = self
            .http
            .post(format!("{}/upload/complete", self.base_url))
            .query(&[("fileId", file_id)])
            .json(&CompleteUploadRequest {
                upload_id: upload_id.to_string(),
                parts,
            });

        self.send(request, &token).await
    }

    pub async fn abort_upload(&self, upload_id: &str, file_id: &str) -> Result<()> {
        let token = self.backend_token(BackendAction::Abort)?;
        let request = self
            .http
            .delete(format!(
                "{}/upload/abort/{}",
                self.base_url,
                urlencoding::encode(upload_id)
            ))
            .query(&[("fileId", file_id)]);

        let _: serde_json::Value = self.send(request, &token).await?;
        Ok(())
    }

    /// Create, send every part, complete. Aborts on failure after creation.
    pub async fn upload_file(&self, path: &Path, resource_name: &str) -> Result<UploadSummary> {
        let started = Instant::now();

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(ClientError::FileNotFound(path.display().to_string())),
        };
        let file_size = metadata.len();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        tracing::info!(
            file = %path.display(),
            file_size,
            mime_type = %mime_type,
            "Starting upload"
        );

        let created = self.create_upload(resource_name, file_size, &mime_type).await?;

        let finished = async {
            let parts = self.upload_parts(path, &created).await?;
            self.complete_upload(&created.upload_id, resource_name, parts).await
        }
        .await;

        let completed = match finished {
            Ok(completed) => completed,
            Err(e) => {
                if let Err(abort_err) = self.abort_upload(&created.upload_id, resource_name).await {
                    tracing::warn!("Failed to abort upload: {}", abort_err);
                }
                return Err(e);
            }
        };

        Ok(UploadSummary {
            resource_name: resource_name.to_string(),
            file_url: self.file_url(resource_name),
            etag: completed.etag,
            size: completed.size,
            file_size,
            elapsed: started.elapsed(),
        })
    }
}

/// Read up to `chunk_size` bytes; shorter only at end of file
async fn read_chunk(file: &mut File, chunk_size: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    file.take(chunk_size).read_to_end(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::progress::MemoryProgressStore;
    use crate::routes::router;
    use crate::state::AppState;
    use crate::storage::{MemoryBackend, StorageBackend};

    const SECRET: &str = "client-test";

    async fn spawn_server(chunk_size: u64) -> (String, MemoryBackend) {
        let mut config = Config::default();
        config.auth.jwt_secret = SECRET.to_string();
        config.upload.chunk_size = chunk_size;

        let backend = MemoryBackend::new();
        let state = AppState::new(
            config,
            Arc::new(backend.clone()),
            Arc::new(MemoryProgressStore::new()),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        (format!("http://{}", addr), backend)
    }

    fn uploader(url: &str, secret: &str) -> MultipartUploader {
        MultipartUploader::new(&ClientConfig {
            worker_url: format!("{}/", url),
            jwt_secret: secret.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_file_url_is_encoded() {
        let u = uploader("http://localhost:8787", SECRET);
        assert_eq!(u.base_url(), "http://localhost:8787");
        assert_eq!(u.file_url("my file"), "http://localhost:8787/file/my%20file");
    }

    #[tokio::test]
    async fn test_read_chunk_stops_at_eof() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();

        let mut file = File::open(tmp.path()).await.unwrap();
        assert_eq!(read_chunk(&mut file, 4).await.unwrap(), b"0123");
        assert_eq!(read_chunk(&mut file, 4).await.unwrap(), b"4567");
        assert_eq!(read_chunk(&mut file, 4).await.unwrap(), b"89");
        assert!(read_chunk(&mut file, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_file_end_to_end() {
        let (url, backend) = spawn_server(8).await;
        let mut tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        tmp.write_all(b"twenty bytes of text").unwrap();

        let summary = uploader(&url, SECRET)
            .upload_file(tmp.path(), "greeting")
            .await
            .unwrap();
        assert_eq!(summary.size, 20);
        assert_eq!(summary.file_url, format!("{}/file/greeting", url));

        let object = backend.get("greeting").await.unwrap().unwrap();
        assert_eq!(&object.data[..], b"twenty bytes of text");
        assert_eq!(object.metadata.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_wrong_secret_fails_before_any_upload() {
        let (url, backend) = spawn_server(8).await;
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"data").unwrap();

        let err = uploader(&url, "not-the-secret")
            .upload_file(tmp.path(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));
        assert_eq!(backend.active_uploads().await, 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let u = uploader("http://127.0.0.1:1", SECRET);
        let err = u
            .upload_file(Path::new("/definitely/not/here.bin"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::FileNotFound(_)));
    }
}
