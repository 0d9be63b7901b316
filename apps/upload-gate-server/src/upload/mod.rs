//! Multipart Upload Module
//!
//! Orchestrates token-scoped multipart uploads against a storage backend:
//!
//! 1. A backend-authorized caller creates the upload and receives a client token
//! 2. The client sends parts strictly in order, each checked against stored progress
//! 3. The backend completes or aborts, which ends the session

pub mod service;
pub mod session;
pub mod types;

pub use service::UploadService;
pub use session::{progress_percent, total_parts, UploadSession};
pub use types::*;
