//! Bearer-token session extraction.
//!
//! `Session` verifies `Authorization: Bearer <token>` and exposes the claims
//! to handlers. A missing header answers 401; a header without a valid
//! bearer token answers 403. `require_session` runs the same check as
//! middleware and stores the session in the request extensions for
//! downstream handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use std::sync::Arc;
use tracing::debug;

use crate::{
    api::error::ApiError,
    auth::{token::SessionClaims, AuthService},
};

/// Verified claims of the caller.
#[derive(Clone, Debug)]
pub struct Session(pub SessionClaims);

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Self>() {
            return Ok(session.clone());
        }

        let Extension(auth) = Extension::<Arc<AuthService>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Internal("auth service not configured".to_string()))?;

        if !parts.headers.contains_key(AUTHORIZATION) {
            return Err(ApiError::Unauthorized("No token provided".to_string()));
        }

        // a header without a usable bearer token is treated like a bad token
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Forbidden("Invalid token".to_string()))?;

        let claims = auth.verify(token)?;

        debug!(user_id = %claims.id, role = %claims.role, "session verified");

        Ok(Self(claims))
    }
}

/// Reject requests without a valid session token.
pub async fn require_session(session: Session, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(session);
    next.run(request).await
}
