//! Application state management

use std::sync::Arc;

use chrono::Duration;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::progress::ProgressStore;
use crate::storage::StorageBackend;
use crate::upload::UploadService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    uploads: UploadService,
}

impl AppState {
    /// Wire the upload service from configuration and its two collaborators
    pub fn new(
        config: Config,
        backend: Arc<dyn StorageBackend>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        let issuer = TokenIssuer::new(&config.auth.jwt_secret).with_ttls(
            Duration::seconds(config.auth.client_token_ttl_secs),
            Duration::seconds(config.auth.backend_token_ttl_secs),
        );
        let uploads = UploadService::new(issuer, progress, backend, config.upload.chunk_size);

        Self {
            inner: Arc::new(AppStateInner { config, uploads }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the token issuer
    pub fn issuer(&self) -> &TokenIssuer {
        self.inner.uploads.issuer()
    }

    /// Get the upload orchestrator
    pub fn uploads(&self) -> &UploadService {
        &self.inner.uploads
    }
}
