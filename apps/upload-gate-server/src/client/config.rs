//! Client configuration file

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ClientError;

pub const DEFAULT_CONFIG_FILE: &str = "upload_config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the upload server
    pub worker_url: String,

    /// Same secret the server signs tokens with
    pub jwt_secret: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            worker_url: "http://localhost:8787".to_string(),
            jwt_secret: "your-jwt-secret-here".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ClientError::ConfigNotFound(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|source| ClientError::InvalidConfig {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write a placeholder config for the user to edit
    pub fn write_sample(path: impl AsRef<Path>) -> Result<(), ClientError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&ClientConfig::default()).map_err(|source| {
            ClientError::InvalidConfig {
                path: path.display().to_string(),
                source,
            }
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
