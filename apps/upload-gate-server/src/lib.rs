//! Upload Gate
//!
//! Token-scoped multipart uploads to S3-compatible storage. Backend callers
//! mint short-lived capability tokens; clients stream parts strictly in order
//! against a durable progress counter.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod progress;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;
