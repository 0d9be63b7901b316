//! Route modules for the Upload Gate server

pub mod files;
pub mod health;
pub mod upload;

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    // Room for one full chunk plus slack; the part handler enforces the rest
    let part_limit = usize::try_from(state.config().upload.chunk_size.saturating_mul(2))
        .unwrap_or(usize::MAX);

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/upload/create", post(upload::create_upload))
        .route(
            "/upload/part/:partNumber",
            put(upload::upload_part).layer(DefaultBodyLimit::max(part_limit)),
        )
        .route("/upload/complete", post(upload::complete_upload))
        .route("/upload/abort/:uploadId", delete(upload::abort_upload))
        .route("/upload/progress", get(upload::upload_progress))
        .route(
            "/file/:fileId",
            get(files::serve_file).delete(files::delete_file),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("Handler panicked: {}", detail)).into_response()
}
