//! Configuration management for Upload Gate Server

use serde::Deserialize;
use std::env;

use crate::upload::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};

/// Errors raised while reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub provider: StorageProvider,
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: Option<String>,
}

/// Which `StorageBackend` implementation the server runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    S3,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Minio,
    R2,
    S3,
    B2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret for backend and client tokens
    pub jwt_secret: String,
    pub client_token_ttl_secs: i64,
    pub backend_token_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub chunk_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8787,
            },
            storage: StorageConfig {
                backend: BackendKind::S3,
                provider: StorageProvider::Minio,
                endpoint: "http://localhost:9000".to_string(),
                bucket: "uploads".to_string(),
                access_key: "admin".to_string(),
                secret_key: "password123".to_string(),
                region: Some("us-east-1".to_string()),
            },
            database: DatabaseConfig {
                url: "sqlite:./upload-gate.db".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me".to_string(),
                client_token_ttl_secs: 2 * 60 * 60,
                backend_token_ttl_secs: 60 * 60,
            },
            upload: UploadConfig {
                chunk_size: DEFAULT_CHUNK_SIZE,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::var("STORAGE_BACKEND").unwrap_or_else(|_| "s3".to_string()).as_str() {
            "memory" => BackendKind::Memory,
            "s3" => BackendKind::S3,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        // The in-memory backend needs no credentials
        let required = |name: &'static str, fallback: &str| -> Result<String, ConfigError> {
            match env::var(name) {
                Ok(value) => Ok(value),
                Err(_) if backend == BackendKind::Memory => Ok(fallback.to_string()),
                Err(_) => Err(ConfigError::Missing(name)),
            }
        };

        let chunk_size = check_chunk_size(parse_var("UPLOAD_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?)?;

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 8787)?,
            },
            storage: StorageConfig {
                backend,
                provider: match env::var("S3_PROVIDER").unwrap_or_else(|_| "minio".to_string()).as_str() {
                    "r2" => StorageProvider::R2,
                    "s3" => StorageProvider::S3,
                    "b2" => StorageProvider::B2,
                    _ => StorageProvider::Minio,
                },
                endpoint: required("S3_ENDPOINT", "memory://")?,
                bucket: required("S3_BUCKET", "uploads")?,
                access_key: required("S3_ACCESS_KEY", "")?,
                secret_key: required("S3_SECRET_KEY", "")?,
                region: env::var("S3_REGION").ok(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./upload-gate.db".to_string()),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
                client_token_ttl_secs: parse_var("CLIENT_TOKEN_TTL_SECS", 2 * 60 * 60)?,
                backend_token_ttl_secs: parse_var("BACKEND_TOKEN_TTL_SECS", 60 * 60)?,
            },
            upload: UploadConfig { chunk_size },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Part size must be positive and within what a backend will accept
fn check_chunk_size(chunk_size: u64) -> Result<u64, ConfigError> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(ConfigError::Invalid {
            name: "UPLOAD_CHUNK_SIZE",
            value: chunk_size.to_string(),
        });
    }
    Ok(chunk_size)
}
