use axum::{extract::rejection::JsonRejection, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::instrument;

use super::session::Session;
use crate::{
    api::error::ApiError,
    auth::AuthService,
    models::{Credentials, LoginResponse, Message, TokenCheck},
};

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = Credentials,
    responses(
        (status = 201, description = "User registered", body = Message),
        (status = 400, description = "Missing fields or username already taken", body = Message),
    ),
    tag = "auth"
)]
#[instrument(skip(auth, payload))]
pub async fn register(
    Extension(auth): Extension<Arc<AuthService>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Json(credentials) = payload?;

    auth.register(
        &credentials.username,
        &credentials.password,
        credentials.role.unwrap_or_default(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Message::new("User registered successfully")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "User not found", body = Message),
        (status = 401, description = "Invalid credentials", body = Message),
    ),
    tag = "auth"
)]
#[instrument(skip(auth, payload))]
pub async fn login(
    Extension(auth): Extension<Arc<AuthService>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(credentials) = payload?;

    let token = auth
        .login(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

#[utoipa::path(
    get,
    path = "/api/test",
    responses(
        (status = 200, description = "Token is valid", body = TokenCheck),
        (status = 401, description = "No token provided", body = Message),
        (status = 403, description = "Invalid or expired token", body = Message),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn test_token(Session(claims): Session) -> Json<TokenCheck> {
    Json(TokenCheck {
        message: "Token is valid!".to_string(),
        user: claims,
    })
}
