//! Token issuing and verification

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::claims::{BackendAction, BackendClaims, Capability, ClientClaims, TokenKind};
use super::{jwt, AuthError};

/// Default lifetime of a client token: long enough for a slow multi-part
/// transfer, short enough to bound exposure if leaked.
pub const DEFAULT_CLIENT_TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

/// Default lifetime of a backend token
pub const DEFAULT_BACKEND_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Mints and verifies capability tokens with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Arc<[u8]>,
    client_ttl: Duration,
    backend_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
            client_ttl: Duration::seconds(DEFAULT_CLIENT_TOKEN_TTL_SECS),
            backend_ttl: Duration::seconds(DEFAULT_BACKEND_TOKEN_TTL_SECS),
        }
    }

    pub fn with_ttls(mut self, client_ttl: Duration, backend_ttl: Duration) -> Self {
        self.client_ttl = client_ttl;
        self.backend_ttl = backend_ttl;
        self
    }

    pub fn client_ttl(&self) -> Duration {
        self.client_ttl
    }

    pub fn backend_ttl(&self) -> Duration {
        self.backend_ttl
    }

    /// Sign a backend capability for `action`
    pub fn issue_backend_token(&self, action: BackendAction, ttl: Duration) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let capability = Capability::Backend(BackendClaims {
            action,
            iat,
            exp: iat + ttl.num_seconds(),
        });
        jwt::sign(&capability, &self.secret)
    }

    /// Sign a client capability scoped to one upload session
    pub fn issue_client_token(
        &self,
        upload_id: &str,
        file_id: &str,
        max_file_size: u64,
        mime_type: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let capability = Capability::Client(ClientClaims {
            upload_id: upload_id.to_string(),
            file_id: file_id.to_string(),
            max_file_size,
            mime_type: mime_type.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
        });
        jwt::sign(&capability, &self.secret)
    }

    /// Check signature, kind and expiry. Valid only while `now < exp`.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Capability, AuthError> {
        let capability: Capability = jwt::verify(token, &self.secret)?;

        if capability.kind() != expected {
            return Err(AuthError::WrongKind {
                expected,
                actual: capability.kind(),
            });
        }

        if Utc::now().timestamp() >= capability.expires_at() {
            return Err(AuthError::Expired);
        }

        Ok(capability)
    }

    pub fn verify_backend(&self, token: &str) -> Result<BackendClaims, AuthError> {
        match self.verify(token, TokenKind::Backend)? {
            Capability::Backend(claims) => Ok(claims),
            Capability::Client(_) => Err(AuthError::WrongKind {
                expected: TokenKind::Backend,
                actual: TokenKind::Client,
            }),
        }
    }

    pub fn verify_client(&self, token: &str) -> Result<ClientClaims, AuthError> {
        match self.verify(token, TokenKind::Client)? {
            Capability::Client(claims) => Ok(claims),
            Capability::Backend(_) => Err(AuthError::WrongKind {
                expected: TokenKind::Client,
                actual: TokenKind::Backend,
            }),
        }
    }
}
