//! Capability tokens
//!
//! Short-lived HS256 bearer tokens replace persistent credentials:
//! - Backend tokens authorize administrative operations (create, complete, abort)
//! - Client tokens are scoped to exactly one upload session
//!
//! Tokens are verified on every request; nothing is cached between requests.

mod claims;
mod extract;
mod issuer;
pub mod jwt;

pub use claims::{BackendAction, BackendClaims, Capability, ClientClaims, TokenKind};
pub use extract::{BackendAuth, ClientAuth};
pub use issuer::TokenIssuer;

/// Token verification failures. All of them surface as HTTP 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingHeader,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token type: expected {expected}, got {actual}")]
    WrongKind { expected: TokenKind, actual: TokenKind },

    #[error("Invalid token action: expected {expected}, got {actual}")]
    WrongAction {
        expected: BackendAction,
        actual: BackendAction,
    },

    #[error("Token expired")]
    Expired,
}
