//! File serving routes
//!
//! Serves completed uploads straight from the storage backend. Object keys are
//! written once, so responses are cacheable forever.

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};

use crate::auth::BackendAuth;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::upload::MessageResponse;

const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// GET /file/:fileId
pub async fn serve_file(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Path(file_id) = path?;
    let object = state.uploads().get_file(&file_id).await?;

    let content_type = object
        .metadata
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(&file_id));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, object.data.len())
        .header(header::CACHE_CONTROL, IMMUTABLE_CACHE);

    if let Some(etag) = &object.metadata.etag {
        builder = builder.header(header::ETAG, etag);
    }

    builder
        .body(Body::from(object.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// DELETE /file/:fileId
///
/// Any backend token will do; the action claim is not checked here.
pub async fn delete_file(
    State(state): State<AppState>,
    BackendAuth(_claims): BackendAuth,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let Path(file_id) = path?;
    state.uploads().delete_file(&file_id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: format!("File {} deleted", file_id),
    }))
}

/// Guess content type from file extension
fn guess_content_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
