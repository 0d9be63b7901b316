//! Upload orchestration
//!
//! Composes token issuing, the progress store and the storage backend into the
//! externally visible operations. Each call is independent; no session object
//! outlives a request.

use std::sync::Arc;

use axum::body::Bytes;

use crate::auth::{ClientClaims, TokenIssuer};
use crate::error::{AppError, Result};
use crate::progress::{ProgressStore, UploadLocks};
use crate::storage::{PartRecord, StorageBackend, StorageObject};

use super::session::{check_part_shape, progress_percent, total_parts, UploadSession};
use super::types::{
    CompleteUploadRequest, CompleteUploadResponse, CreateUploadRequest, CreateUploadResponse,
    PartUploadResponse, ProgressResponse, SessionStatus,
};

/// Upload orchestrator
#[derive(Clone)]
pub struct UploadService {
    inner: Arc<UploadServiceInner>,
}

struct UploadServiceInner {
    issuer: TokenIssuer,
    progress: Arc<dyn ProgressStore>,
    backend: Arc<dyn StorageBackend>,
    locks: UploadLocks,
    chunk_size: u64,
}

impl UploadService {
    pub fn new(
        issuer: TokenIssuer,
        progress: Arc<dyn ProgressStore>,
        backend: Arc<dyn StorageBackend>,
        chunk_size: u64,
    ) -> Self {
        Self {
            inner: Arc::new(UploadServiceInner {
                issuer,
                progress,
                backend,
                locks: UploadLocks::new(),
                chunk_size,
            }),
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.inner.chunk_size
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.inner.issuer
    }

    // ========================================================================
    // Session Lifecycle
    // ========================================================================

    /// Start a multipart upload and hand out a client token scoped to it
    pub async fn create(&self, request: CreateUploadRequest) -> Result<CreateUploadResponse> {
        if request.id.trim().is_empty() {
            return Err(AppError::Validation("File id must not be empty".to_string()));
        }
        if request.file_size == 0 {
            return Err(AppError::Validation("File size must be greater than 0".to_string()));
        }
        if request.mime_type.trim().is_empty() {
            return Err(AppError::Validation("MIME type must not be empty".to_string()));
        }

        let backend = &self.inner.backend;
        let handle = backend
            .create_multipart_upload(&request.id, &request.mime_type)
            .await?;

        if let Err(e) = self.inner.progress.put(&handle.upload_id, 0).await {
            // Don't leave an upload behind that no client could ever finish
            if let Err(abort_err) = backend.abort(&handle).await {
                tracing::warn!(
                    upload_id = %handle.upload_id,
                    "Failed to abort orphaned upload: {}",
                    abort_err
                );
            }
            return Err(e);
        }

        let client_token = self
            .inner
            .issuer
            .issue_client_token(
                &handle.upload_id,
                &request.id,
                request.file_size,
                &request.mime_type,
                self.inner.issuer.client_ttl(),
            )
            .map_err(|e| AppError::Internal(format!("Failed to sign client token: {}", e)))?;

        let total_parts = total_parts(request.file_size, self.inner.chunk_size);

        tracing::info!(
            upload_id = %handle.upload_id,
            file_id = %request.id,
            file_size = request.file_size,
            total_parts = total_parts,
            "Created upload session"
        );

        Ok(CreateUploadResponse {
            success: true,
            upload_id: handle.upload_id,
            file_id: request.id,
            total_parts,
            chunk_size: self.inner.chunk_size,
            client_token,
        })
    }

    /// Accept the next part of the upload named by `claims`
    pub async fn upload_part(
        &self,
        claims: &ClientClaims,
        part_number: u32,
        body: Bytes,
        is_last: bool,
    ) -> Result<PartUploadResponse> {
        let len = body.len() as u64;
        check_part_shape(part_number, len, is_last, self.inner.chunk_size)?;

        // Serialize parts of the same upload within this process; the
        // compare-and-swap below catches writers in other processes.
        let _guard = self.inner.locks.acquire(&claims.upload_id).await;

        let (uploaded_bytes, status) = self.session_state(&claims.upload_id).await?;
        let mut session = UploadSession::new(claims, self.inner.chunk_size, uploaded_bytes);
        session.status = status;
        let new_progress = session.accept_part(part_number, len)?;

        let handle = self
            .inner
            .backend
            .resume_multipart_upload(&claims.file_id, &claims.upload_id);
        let part = self
            .inner
            .backend
            .upload_part(&handle, part_number, body)
            .await?;

        let swapped = self
            .inner
            .progress
            .put_if(&claims.upload_id, uploaded_bytes, new_progress)
            .await?;
        if !swapped {
            tracing::warn!(
                upload_id = %claims.upload_id,
                part_number = part_number,
                "Progress moved during part upload"
            );
            return Err(AppError::Conflict(claims.upload_id.clone()));
        }
        session.record_part(len);

        if session.is_fully_uploaded() {
            tracing::info!(
                upload_id = %claims.upload_id,
                parts = part_number,
                "All bytes received, awaiting completion"
            );
        }

        tracing::debug!(
            upload_id = %claims.upload_id,
            part_number = part_number,
            uploaded_bytes = session.uploaded_bytes,
            total_bytes = session.total_size,
            progress = session.progress_percent(),
            "Part uploaded"
        );

        Ok(PartUploadResponse {
            success: true,
            part_number: part.part_number,
            etag: part.etag,
            uploaded_bytes: session.uploaded_bytes,
            total_bytes: session.total_size,
        })
    }

    /// Finalize the object from the recorded parts and clear progress
    pub async fn complete(&self, file_id: &str, request: CompleteUploadRequest) -> Result<CompleteUploadResponse> {
        if request.upload_id.trim().is_empty() {
            return Err(AppError::Validation("Upload id must not be empty".to_string()));
        }
        check_part_list(&request.parts)?;

        let handle = self
            .inner
            .backend
            .resume_multipart_upload(file_id, &request.upload_id);
        let completed = self.inner.backend.complete(&handle, &request.parts).await?;

        self.finish_session(&request.upload_id, SessionStatus::Completed).await;

        tracing::info!(
            upload_id = %request.upload_id,
            file_id = %file_id,
            parts = request.parts.len(),
            size = completed.size,
            "Upload session completed"
        );

        Ok(CompleteUploadResponse {
            success: true,
            etag: completed.etag,
            size: completed.size,
        })
    }

    /// Cancel the upload at the backend and clear progress
    pub async fn abort(&self, file_id: &str, upload_id: &str) -> Result<()> {
        let handle = self.inner.backend.resume_multipart_upload(file_id, upload_id);
        self.inner.backend.abort(&handle).await?;

        self.finish_session(upload_id, SessionStatus::Aborted).await;

        tracing::info!(
            upload_id = %upload_id,
            file_id = %file_id,
            "Upload session aborted"
        );

        Ok(())
    }

    // ========================================================================
    // Query Methods
    // ========================================================================

    pub async fn progress(&self, claims: &ClientClaims) -> Result<ProgressResponse> {
        let (uploaded_bytes, status) = self.session_state(&claims.upload_id).await?;
        if status.is_terminal() {
            return Err(AppError::NotFound(format!(
                "Upload {} is {}",
                claims.upload_id, status
            )));
        }

        Ok(ProgressResponse {
            success: true,
            uploaded_bytes,
            total_bytes: claims.max_file_size,
            progress: progress_percent(uploaded_bytes, claims.max_file_size),
        })
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub async fn get_file(&self, file_id: &str) -> Result<StorageObject> {
        self.inner
            .backend
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        if self.inner.backend.head(file_id).await?.is_none() {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        self.inner.backend.delete(file_id).await?;

        // Stray entries are never read by a valid session
        if let Err(e) = self.inner.progress.delete(file_id).await {
            tracing::warn!(file_id = %file_id, "Failed to clear progress entry: {}", e);
        }

        tracing::info!(file_id = %file_id, "File deleted");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Acknowledged bytes and status. Terminal sessions report zero bytes.
    async fn session_state(&self, upload_id: &str) -> Result<(u64, SessionStatus)> {
        if let Some(uploaded_bytes) = self.inner.progress.get(upload_id).await? {
            return Ok((uploaded_bytes, SessionStatus::Active));
        }

        match self.inner.progress.status(upload_id).await? {
            Some(status) if status.is_terminal() => Ok((0, status)),
            _ => Err(AppError::NotFound(format!(
                "No active upload session: {}",
                upload_id
            ))),
        }
    }

    /// The backend already finalized the upload, so a failure here is only logged
    async fn finish_session(&self, upload_id: &str, status: SessionStatus) {
        match self.inner.progress.finish(upload_id, status).await {
            Ok(true) => {
                tracing::debug!(upload_id = %upload_id, status = %status, "Session finished");
            }
            Ok(false) => {
                tracing::warn!(
                    upload_id = %upload_id,
                    status = %status,
                    "Session was not active when the backend finished it"
                );
            }
            Err(e) => {
                tracing::error!(
                    upload_id = %upload_id,
                    status = %status,
                    "Failed to record session outcome: {}",
                    e
                );
            }
        }
    }
}

/// Parts must be numbered 1, 2, 3, ... in the order given
fn check_part_list(parts: &[PartRecord]) -> Result<()> {
    if parts.is_empty() {
        return Err(AppError::Validation("Parts list must not be empty".to_string()));
    }

    for (index, part) in parts.iter().enumerate() {
        if part.part_number as usize != index + 1 {
            return Err(AppError::Validation(format!(
                "Parts must be numbered contiguously from 1; found {} at position {}",
                part.part_number,
                index + 1
            )));
        }
        if part.etag.is_empty() {
            return Err(AppError::Validation(format!(
                "Part {} has an empty etag",
                part.part_number
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgressStore;
    use crate::storage::MemoryBackend;

    const CHUNK: u64 = 8;

    struct Harness {
        service: UploadService,
        backend: MemoryBackend,
        progress: MemoryProgressStore,
    }

    fn harness() -> Harness {
        let backend = MemoryBackend::new();
        let progress = MemoryProgressStore::new();
        let service = UploadService::new(
            TokenIssuer::new("service-test"),
            Arc::new(progress.clone()),
            Arc::new(backend.clone()),
            CHUNK,
        );
        Harness {
            service,
            backend,
            progress,
        }
    }

    async fn create(h: &Harness, file_size: u64) -> (CreateUploadResponse, ClientClaims) {
        let created = h
            .service
            .create(CreateUploadRequest {
                id: "report.bin".to_string(),
                file_size,
                mime_type: "application/octet-stream".to_string(),
            })
            .await
            .unwrap();
        let claims = h.service.issuer().verify_client(&created.client_token).unwrap();
        (created, claims)
    }

    fn bytes(len: u64) -> Bytes {
        Bytes::from(vec![7u8; len as usize])
    }

    #[tokio::test]
    async fn test_create_initializes_progress() {
        let h = harness();
        let (created, claims) = create(&h, 20).await;

        assert!(created.success);
        assert_eq!(created.total_parts, 3);
        assert_eq!(created.chunk_size, CHUNK);
        assert_eq!(claims.upload_id, created.upload_id);
        assert_eq!(claims.max_file_size, 20);
        assert_eq!(h.progress.get(&created.upload_id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let h = harness();
        let err = h
            .service
            .create(CreateUploadRequest {
                id: "x".into(),
                file_size: 0,
                mime_type: "text/plain".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.backend.active_uploads().await, 0);
    }

    #[tokio::test]
    async fn test_full_upload_then_complete() {
        let h = harness();
        let (created, claims) = create(&h, 20).await;

        let mut parts = Vec::new();
        for (n, len, last) in [(1u32, 8u64, false), (2, 8, false), (3, 4, true)] {
            let resp = h.service.upload_part(&claims, n, bytes(len), last).await.unwrap();
            assert_eq!(resp.total_bytes, 20);
            parts.push(PartRecord {
                part_number: resp.part_number,
                etag: resp.etag,
            });
        }
        assert_eq!(h.service.progress(&claims).await.unwrap().progress, 100.0);

        let done = h
            .service
            .complete(
                "report.bin",
                CompleteUploadRequest {
                    upload_id: created.upload_id.clone(),
                    parts,
                },
            )
            .await
            .unwrap();
        assert_eq!(done.size, 20);

        // The stale counter is never returned once the session is completed
        assert!(matches!(
            h.service.progress(&claims).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(h.progress.active_len().await, 0);
        assert_eq!(
            h.progress.status(&created.upload_id).await.unwrap(),
            Some(SessionStatus::Completed)
        );
    }

    #[tokio::test]
    async fn test_parts_after_complete_are_rejected() {
        let h = harness();
        let (created, claims) = create(&h, 4).await;
        let part = h.service.upload_part(&claims, 1, bytes(4), true).await.unwrap();
        h.service
            .complete(
                "report.bin",
                CompleteUploadRequest {
                    upload_id: created.upload_id.clone(),
                    parts: vec![PartRecord {
                        part_number: 1,
                        etag: part.etag,
                    }],
                },
            )
            .await
            .unwrap();

        // A client token outlives the session; the terminal status still wins
        let err = h.service.upload_part(&claims, 2, bytes(4), true).await.unwrap_err();
        match err {
            AppError::NotFound(message) => assert!(message.contains("completed")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_out_of_order_part_never_reaches_backend() {
        let h = harness();
        let (created, claims) = create(&h, 20).await;

        let err = h.service.upload_part(&claims, 2, bytes(8), false).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfSequence { .. }));
        assert_eq!(h.backend.part_count(&created.upload_id).await, Some(0));
        assert_eq!(h.progress.get(&created.upload_id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_undersized_non_final_part_rejected() {
        let h = harness();
        let (_, claims) = create(&h, 20).await;

        let err = h.service.upload_part(&claims, 1, bytes(3), false).await.unwrap_err();
        assert!(matches!(err, AppError::PartTooSmall { .. }));

        // The same length is fine as the last part
        let resp = h.service.upload_part(&claims, 1, bytes(3), true).await.unwrap();
        assert_eq!(resp.uploaded_bytes, 3);
    }

    #[tokio::test]
    async fn test_retried_part_is_rejected() {
        let h = harness();
        let (_, claims) = create(&h, 20).await;

        h.service.upload_part(&claims, 1, bytes(8), false).await.unwrap();
        let err = h.service.upload_part(&claims, 1, bytes(8), false).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfSequence { .. }));
        assert_eq!(h.service.progress(&claims).await.unwrap().uploaded_bytes, 8);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_count_once() {
        let h = harness();
        let (_, claims) = create(&h, 20).await;

        let a = {
            let service = h.service.clone();
            let claims = claims.clone();
            tokio::spawn(async move { service.upload_part(&claims, 1, bytes(8), false).await })
        };
        let b = {
            let service = h.service.clone();
            let claims = claims.clone();
            tokio::spawn(async move { service.upload_part(&claims, 1, bytes(8), false).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(h.service.progress(&claims).await.unwrap().uploaded_bytes, 8);
    }

    #[tokio::test]
    async fn test_lost_compare_and_swap_is_a_conflict() {
        let h = harness();
        let (created, claims) = create(&h, 20).await;

        // Another process moves the counter behind our back
        let store = h.progress.clone();
        let upload_id = created.upload_id.clone();
        let racer = Arc::new(RacingStore { store, upload_id });
        let service = UploadService::new(
            TokenIssuer::new("service-test"),
            racer,
            Arc::new(h.backend.clone()),
            CHUNK,
        );

        let err = service.upload_part(&claims, 1, bytes(8), false).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    /// Progress store whose compare-and-swap always loses the race
    struct RacingStore {
        store: MemoryProgressStore,
        upload_id: String,
    }

    #[async_trait::async_trait]
    impl ProgressStore for RacingStore {
        async fn get(&self, upload_id: &str) -> Result<Option<u64>> {
            self.store.get(upload_id).await
        }

        async fn put(&self, upload_id: &str, uploaded_bytes: u64) -> Result<()> {
            self.store.put(upload_id, uploaded_bytes).await
        }

        async fn put_if(&self, upload_id: &str, expected: u64, uploaded_bytes: u64) -> Result<bool> {
            self.store.put(&self.upload_id, expected + 1).await?;
            self.store.put_if(upload_id, expected, uploaded_bytes).await
        }

        async fn finish(&self, upload_id: &str, status: SessionStatus) -> Result<bool> {
            self.store.finish(upload_id, status).await
        }

        async fn status(&self, upload_id: &str) -> Result<Option<SessionStatus>> {
            self.store.status(upload_id).await
        }

        async fn delete(&self, upload_id: &str) -> Result<bool> {
            self.store.delete(upload_id).await
        }
    }

    /// Progress store with switchable write failures
    #[derive(Clone, Default)]
    struct FailingStore {
        store: MemoryProgressStore,
        fail_put: bool,
        fail_finish: bool,
        fail_delete: bool,
    }

    fn unavailable() -> AppError {
        AppError::Internal("progress store unavailable".to_string())
    }

    #[async_trait::async_trait]
    impl ProgressStore for FailingStore {
        async fn get(&self, upload_id: &str) -> Result<Option<u64>> {
            self.store.get(upload_id).await
        }

        async fn put(&self, upload_id: &str, uploaded_bytes: u64) -> Result<()> {
            if self.fail_put {
                return Err(unavailable());
            }
            self.store.put(upload_id, uploaded_bytes).await
        }

        async fn put_if(&self, upload_id: &str, expected: u64, uploaded_bytes: u64) -> Result<bool> {
            self.store.put_if(upload_id, expected, uploaded_bytes).await
        }

        async fn finish(&self, upload_id: &str, status: SessionStatus) -> Result<bool> {
            if self.fail_finish {
                return Err(unavailable());
            }
            self.store.finish(upload_id, status).await
        }

        async fn status(&self, upload_id: &str) -> Result<Option<SessionStatus>> {
            self.store.status(upload_id).await
        }

        async fn delete(&self, upload_id: &str) -> Result<bool> {
            if self.fail_delete {
                return Err(unavailable());
            }
            self.store.delete(upload_id).await
        }
    }

    fn service_with(store: FailingStore, backend: &MemoryBackend) -> UploadService {
        UploadService::new(
            TokenIssuer::new("service-test"),
            Arc::new(store),
            Arc::new(backend.clone()),
            CHUNK,
        )
    }

    fn create_request() -> CreateUploadRequest {
        CreateUploadRequest {
            id: "report.bin".to_string(),
            file_size: 4,
            mime_type: "application/octet-stream".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_aborts_backend_upload_when_progress_write_fails() {
        let backend = MemoryBackend::new();
        let store = FailingStore {
            fail_put: true,
            ..Default::default()
        };
        let service = service_with(store, &backend);

        let err = service.create(create_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(backend.active_uploads().await, 0);
    }

    #[tokio::test]
    async fn test_complete_succeeds_when_outcome_cannot_be_recorded() {
        let backend = MemoryBackend::new();
        let store = FailingStore {
            fail_finish: true,
            ..Default::default()
        };
        let service = service_with(store.clone(), &backend);

        let created = service.create(create_request()).await.unwrap();
        let claims = service.issuer().verify_client(&created.client_token).unwrap();
        let part = service.upload_part(&claims, 1, bytes(4), true).await.unwrap();

        let done = service
            .complete(
                "report.bin",
                CompleteUploadRequest {
                    upload_id: created.upload_id.clone(),
                    parts: vec![PartRecord {
                        part_number: 1,
                        etag: part.etag,
                    }],
                },
            )
            .await
            .unwrap();
        assert_eq!(done.size, 4);
        assert!(backend.get("report.bin").await.unwrap().is_some());
        assert_eq!(store.store.get(&created.upload_id).await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_abort_succeeds_when_outcome_cannot_be_recorded() {
        let backend = MemoryBackend::new();
        let store = FailingStore {
            fail_finish: true,
            ..Default::default()
        };
        let service = service_with(store, &backend);

        let created = service.create(create_request()).await.unwrap();
        service.abort("report.bin", &created.upload_id).await.unwrap();
        assert_eq!(backend.active_uploads().await, 0);
    }

    #[tokio::test]
    async fn test_delete_file_succeeds_when_progress_delete_fails() {
        let backend = MemoryBackend::new();
        backend.put_object("cover.png", "image/png", vec![1u8, 2, 3]).await;
        let store = FailingStore {
            fail_delete: true,
            ..Default::default()
        };
        let service = service_with(store, &backend);

        service.delete_file("cover.png").await.unwrap();
        assert!(backend.head("cover.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_abort_blocks_further_parts() {
        let h = harness();
        let (created, claims) = create(&h, 20).await;

        h.service.upload_part(&claims, 1, bytes(8), false).await.unwrap();
        h.service.abort("report.bin", &created.upload_id).await.unwrap();

        let err = h.service.upload_part(&claims, 2, bytes(8), false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(
            h.service.progress(&claims).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(h.backend.active_uploads().await, 0);
    }

    #[tokio::test]
    async fn test_abort_with_zero_parts() {
        let h = harness();
        let (created, _) = create(&h, 20).await;
        h.service.abort("report.bin", &created.upload_id).await.unwrap();
        assert_eq!(h.progress.get(&created.upload_id).await.unwrap(), None);
        assert_eq!(
            h.progress.status(&created.upload_id).await.unwrap(),
            Some(SessionStatus::Aborted)
        );
    }

    #[tokio::test]
    async fn test_second_complete_surfaces_backend_error() {
        let h = harness();
        let (created, claims) = create(&h, 4).await;
        let part = h.service.upload_part(&claims, 1, bytes(4), true).await.unwrap();
        let request = CompleteUploadRequest {
            upload_id: created.upload_id.clone(),
            parts: vec![PartRecord {
                part_number: 1,
                etag: part.etag,
            }],
        };

        h.service.complete("report.bin", request.clone()).await.unwrap();
        let err = h.service.complete("report.bin", request).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn test_complete_validates_part_list() {
        let h = harness();
        let (created, _) = create(&h, 20).await;

        let gap = CompleteUploadRequest {
            upload_id: created.upload_id.clone(),
            parts: vec![
                PartRecord { part_number: 1, etag: "a".into() },
                PartRecord { part_number: 3, etag: "b".into() },
            ],
        };
        assert!(matches!(
            h.service.complete("report.bin", gap).await,
            Err(AppError::Validation(_))
        ));

        let empty = CompleteUploadRequest {
            upload_id: created.upload_id,
            parts: vec![],
        };
        assert!(matches!(
            h.service.complete("report.bin", empty).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_file_clears_stray_progress() {
        let h = harness();
        h.backend.put_object("cover.png", "image/png", vec![1u8, 2, 3]).await;
        h.progress.put("cover.png", 3).await.unwrap();

        h.service.delete_file("cover.png").await.unwrap();
        assert!(h.backend.head("cover.png").await.unwrap().is_none());
        assert_eq!(h.progress.get("cover.png").await.unwrap(), None);

        assert!(matches!(
            h.service.delete_file("cover.png").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_missing_file() {
        let h = harness();
        assert!(matches!(
            h.service.get_file("nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
