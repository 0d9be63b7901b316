//! Upload client
//!
//! Drives the multipart protocol from the backend side: mints backend tokens
//! with the shared secret, streams a local file part by part with the client
//! token it receives, and aborts the upload if anything fails after creation.

mod config;
mod uploader;

pub use config::{ClientConfig, DEFAULT_CONFIG_FILE};
pub use uploader::{MultipartUploader, UploadSummary};

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration file {0} not found")]
    ConfigNotFound(String),

    #[error("Invalid JSON in configuration file {path}: {source}")]
    InvalidConfig {
        path: String,
        source: serde_json::Error,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to sign token: {0}")]
    Token(#[from] AuthError),
}
