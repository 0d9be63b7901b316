//! Axum extractors for bearer capability tokens

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;
use crate::state::AppState;

use super::{AuthError, BackendClaims, ClientClaims};

/// A verified backend capability. Handlers still check the action.
#[derive(Debug, Clone)]
pub struct BackendAuth(pub BackendClaims);

/// A verified client capability scoped to one upload
#[derive(Debug, Clone)]
pub struct ClientAuth(pub ClientClaims);

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingHeader)
}

#[async_trait]
impl FromRequestParts<AppState> for BackendAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.issuer().verify_backend(token)?;
        Ok(BackendAuth(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.issuer().verify_client(token)?;
        Ok(ClientAuth(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def.ghi"))), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&parts_with(None)), Err(AuthError::MissingHeader));
        assert_eq!(bearer_token(&parts_with(Some("Basic xyz"))), Err(AuthError::MissingHeader));
        assert_eq!(bearer_token(&parts_with(Some("Bearer   "))), Err(AuthError::MissingHeader));
    }
}
