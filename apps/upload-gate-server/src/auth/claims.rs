//! Claim shapes carried inside capability tokens

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AuthError;

/// Administrative action a backend token grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendAction {
    Create,
    Complete,
    Abort,
}

impl fmt::Display for BackendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendAction::Create => "create",
            BackendAction::Complete => "complete",
            BackendAction::Abort => "abort",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Backend,
    Client,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Backend => "backend",
            TokenKind::Client => "client",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendClaims {
    pub action: BackendAction,
    pub iat: i64,
    pub exp: i64,
}

impl BackendClaims {
    /// Require this token to grant `action`
    pub fn require(&self, action: BackendAction) -> Result<(), AuthError> {
        if self.action != action {
            return Err(AuthError::WrongAction {
                expected: action,
                actual: self.action,
            });
        }
        Ok(())
    }
}

/// Claims scoping a token to one upload session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientClaims {
    pub upload_id: String,
    pub file_id: String,
    pub max_file_size: u64,
    pub mime_type: String,
    pub iat: i64,
    pub exp: i64,
}

/// A decoded capability, discriminated by the `type` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Capability {
    Backend(BackendClaims),
    Client(ClientClaims),
}

impl Capability {
    pub fn kind(&self) -> TokenKind {
        match self {
            Capability::Backend(_) => TokenKind::Backend,
            Capability::Client(_) => TokenKind::Client,
        }
    }

    /// Unix timestamp (seconds) after which the token is rejected
    pub fn expires_at(&self) -> i64 {
        match self {
            Capability::Backend(claims) => claims.exp,
            Capability::Client(claims) => claims.exp,
        }
    }
}
