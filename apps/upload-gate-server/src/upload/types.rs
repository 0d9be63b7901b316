//! Upload types for the multipart session protocol

use serde::{Deserialize, Serialize};

use crate::storage::PartRecord;

// ============================================================================
// Constants
// ============================================================================

/// Default chunk size: 5MiB, the S3 floor for non-final multipart parts
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Largest part an S3-compatible backend accepts
pub const MAX_CHUNK_SIZE: u64 = 5 * 1024 * 1024 * 1024;

// ============================================================================
// Session Status
// ============================================================================

/// Lifecycle of an upload session. `Completed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Aborted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Aborted => "aborted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "aborted" => Some(SessionStatus::Aborted),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Create
// ============================================================================

/// Request to start a multipart upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadRequest {
    /// Object key / file identifier
    pub id: String,

    /// Total file size in bytes
    pub file_size: u64,

    /// MIME type of the file
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadResponse {
    pub success: bool,
    pub upload_id: String,
    pub file_id: String,
    pub total_parts: u64,
    pub chunk_size: u64,

    /// Client capability scoped to this upload
    pub client_token: String,
}

// ============================================================================
// Parts
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartQuery {
    #[serde(rename = "isLast", default)]
    pub is_last: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUploadResponse {
    pub success: bool,
    pub part_number: u32,
    pub etag: String,
    pub uploaded_bytes: u64,
    pub total_bytes: u64,
}

// ============================================================================
// Complete / Abort
// ============================================================================

/// `?fileId=` on complete and abort
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileIdQuery {
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub upload_id: String,
    pub parts: Vec<PartRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteUploadResponse {
    pub success: bool,
    pub etag: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub success: bool,
    pub uploaded_bytes: u64,
    pub total_bytes: u64,

    /// Percentage rounded to two decimals
    pub progress: f64,
}
