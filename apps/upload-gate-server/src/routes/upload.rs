//! Upload Routes
//!
//! HTTP endpoints for token-scoped multipart uploads.
//!
//! Endpoints:
//! - POST /upload/create - Start an upload (backend token, action=create)
//! - PUT /upload/part/:partNumber?isLast=bool - Send one part (client token)
//! - POST /upload/complete?fileId=X - Finalize (backend token, action=complete)
//! - DELETE /upload/abort/:uploadId?fileId=X - Cancel (backend token, action=abort)
//! - GET /upload/progress - Bytes acknowledged so far (client token)

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::auth::{BackendAction, BackendAuth, ClientAuth};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::upload::{
    CompleteUploadRequest, CompleteUploadResponse, CreateUploadRequest, CreateUploadResponse,
    FileIdQuery, PartQuery, PartUploadResponse, ProgressResponse, SuccessResponse,
};

type Extracted<T, R> = std::result::Result<T, R>;

/// POST /upload/create
pub async fn create_upload(
    State(state): State<AppState>,
    BackendAuth(claims): BackendAuth,
    payload: Extracted<Json<CreateUploadRequest>, JsonRejection>,
) -> Result<Json<CreateUploadResponse>> {
    claims.require(BackendAction::Create)?;
    let Json(request) = payload?;

    let response = state.uploads().create(request).await?;
    Ok(Json(response))
}

/// PUT /upload/part/:partNumber
pub async fn upload_part(
    State(state): State<AppState>,
    ClientAuth(claims): ClientAuth,
    path: Extracted<Path<u32>, PathRejection>,
    query: Extracted<Query<PartQuery>, QueryRejection>,
    body: Extracted<Bytes, BytesRejection>,
) -> Result<Json<PartUploadResponse>> {
    let Path(part_number) = path?;
    let Query(query) = query?;
    let body = body?;

    let response = state
        .uploads()
        .upload_part(&claims, part_number, body, query.is_last)
        .await?;
    Ok(Json(response))
}

/// POST /upload/complete
pub async fn complete_upload(
    State(state): State<AppState>,
    BackendAuth(claims): BackendAuth,
    query: Extracted<Query<FileIdQuery>, QueryRejection>,
    payload: Extracted<Json<CompleteUploadRequest>, JsonRejection>,
) -> Result<Json<CompleteUploadResponse>> {
    claims.require(BackendAction::Complete)?;
    let file_id = require_file_id(query?.0)?;
    let Json(request) = payload?;

    let response = state.uploads().complete(&file_id, request).await?;
    Ok(Json(response))
}

/// DELETE /upload/abort/:uploadId
pub async fn abort_upload(
    State(state): State<AppState>,
    BackendAuth(claims): BackendAuth,
    path: Extracted<Path<String>, PathRejection>,
    query: Extracted<Query<FileIdQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse>> {
    claims.require(BackendAction::Abort)?;
    let Path(upload_id) = path?;
    let file_id = require_file_id(query?.0)?;

    state.uploads().abort(&file_id, &upload_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /upload/progress
pub async fn upload_progress(
    State(state): State<AppState>,
    ClientAuth(claims): ClientAuth,
) -> Result<Json<ProgressResponse>> {
    let response = state.uploads().progress(&claims).await?;
    Ok(Json(response))
}

fn require_file_id(query: FileIdQuery) -> Result<String> {
    query
        .file_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing fileId query parameter".to_string()))
}

// ============================================================================
// Tests
// ============================================================================
