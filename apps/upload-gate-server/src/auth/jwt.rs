//! Compact HS256 JWS encoding
//!
//! `sign(claims, secret)` / `verify(token, secret)` over HMAC-SHA256. Tokens are
//! interchangeable with any standard JWT library configured for HS256.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};

use super::AuthError;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signature and algorithm only; expiry and token kind are checked by the issuer
fn validation() -> Validation {
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Serialize and sign `claims` into a compact token
pub fn sign<T: Serialize>(claims: &T, secret: &[u8]) -> Result<String, AuthError> {
    encode(&Header::new(ALGORITHM), claims, &EncodingKey::from_secret(secret))
        .map_err(|_| AuthError::Malformed)
}

/// Check the signature and decode the claims. Expiry is not checked here.
pub fn verify<T: DeserializeOwned>(token: &str, secret: &[u8]) -> Result<T, AuthError> {
    decode::<T>(token, &DecodingKey::from_secret(secret), &validation())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Malformed,
        })
}
