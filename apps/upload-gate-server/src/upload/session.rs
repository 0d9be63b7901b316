//! Upload session state machine
//!
//! A session is `Active` until completion or abort moves its progress entry to
//! `Completed` or `Aborted`. Both are terminal and durable, so no part can be
//! accepted afterwards. Parts are accepted strictly in order:
//! part `n` is only valid when exactly `(n - 1) * chunk_size` bytes have been
//! acknowledged.

use crate::auth::ClientClaims;
use crate::error::{AppError, Result};

use super::types::SessionStatus;

/// Number of parts needed for `file_size` bytes
pub fn total_parts(file_size: u64, chunk_size: u64) -> u64 {
    file_size.div_ceil(chunk_size)
}

/// `uploaded / total` as a percentage rounded to two decimals
pub fn progress_percent(uploaded_bytes: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 0.0;
    }
    let percent = uploaded_bytes as f64 / total_bytes as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

/// Checks that need no stored state: part number, non-empty body, chunk floor
pub fn check_part_shape(part_number: u32, len: u64, is_last: bool, chunk_size: u64) -> Result<()> {
    if part_number < 1 {
        return Err(AppError::Validation(
            "Part number must be at least 1".to_string(),
        ));
    }

    if len == 0 {
        return Err(AppError::Validation("Part body is empty".to_string()));
    }

    if !is_last && len < chunk_size {
        return Err(AppError::PartTooSmall {
            size: len,
            min: chunk_size,
        });
    }

    Ok(())
}

/// An active upload, rebuilt per request from its client capability and the
/// stored progress counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_id: String,
    pub file_id: String,
    pub mime_type: String,
    pub total_size: u64,
    pub chunk_size: u64,
    pub uploaded_bytes: u64,
    pub status: SessionStatus,
}

impl UploadSession {
    pub fn new(claims: &ClientClaims, chunk_size: u64, uploaded_bytes: u64) -> Self {
        Self {
            upload_id: claims.upload_id.clone(),
            file_id: claims.file_id.clone(),
            mime_type: claims.mime_type.clone(),
            total_size: claims.max_file_size,
            chunk_size,
            uploaded_bytes,
            status: SessionStatus::Active,
        }
    }

    pub fn total_parts(&self) -> u64 {
        total_parts(self.total_size, self.chunk_size)
    }

    /// Byte offset at which part `part_number` must start. Saturates, so an
    /// offset past `u64::MAX` can never match the stored progress.
    pub fn expected_offset(&self, part_number: u32) -> u64 {
        u64::from(part_number.saturating_sub(1)).saturating_mul(self.chunk_size)
    }

    /// Validate the ordering of a part of `len` bytes and return the progress
    /// value it would produce. Call after [`check_part_shape`].
    pub fn accept_part(&self, part_number: u32, len: u64) -> Result<u64> {
        if self.status.is_terminal() {
            return Err(AppError::NotFound(format!(
                "Upload {} is {}",
                self.upload_id, self.status
            )));
        }

        let expected_offset = self.expected_offset(part_number);
        if self.uploaded_bytes != expected_offset {
            return Err(AppError::OutOfSequence {
                part_number,
                expected_offset,
                uploaded_bytes: self.uploaded_bytes,
            });
        }

        let new_progress = self.uploaded_bytes.saturating_add(len);
        if new_progress > self.total_size {
            return Err(AppError::Validation(format!(
                "Part exceeds declared file size: {} > {}",
                new_progress, self.total_size
            )));
        }

        Ok(new_progress)
    }

    /// Record an accepted part. Progress only ever grows.
    pub fn record_part(&mut self, len: u64) -> u64 {
        self.uploaded_bytes += len;
        self.uploaded_bytes
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.uploaded_bytes, self.total_size)
    }

    pub fn is_fully_uploaded(&self) -> bool {
        self.uploaded_bytes == self.total_size
    }
}

// ============================================================================
// Tests
// ============================================================================
