//! Mapping of domain failures onto HTTP status codes and JSON bodies.
//!
//! Every error renders as `{"message": "..."}`. Duplicate usernames and
//! unknown login names answer 400, which is what existing clients expect.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, mailer::MailError, models::Message, store::StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        (status, Json(Message::new(self.to_string()))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::Conflict(err.to_string()),
            StoreError::Database(db) => Self::Internal(db.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(message) => Self::BadRequest(message),
            AuthError::Conflict => Self::Conflict(err.to_string()),
            // unknown usernames answer 400 like the rest of the login form errors
            AuthError::NotFound => Self::BadRequest(err.to_string()),
            AuthError::Unauthorized => Self::Unauthorized(err.to_string()),
            AuthError::Forbidden(_) => Self::Forbidden(err.to_string()),
            AuthError::Hash(_) | AuthError::Signing(_) => Self::Internal(err.to_string()),
            AuthError::Store(store) => store.into(),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Validation(message) => Self::BadRequest(message),
            // relay details are logged, never returned
            _ => Self::Internal("Error sending email".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenError;
    use axum::body::to_bytes;

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(AuthError::Conflict).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::NotFound).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden(TokenError::Expired)).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn mail_errors_hide_relay_details() {
        let err = ApiError::from(MailError::Delivery("535 auth failed".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Error sending email");
    }

    #[tokio::test]
    async fn renders_json_message() {
        let response = ApiError::NotFound("Student not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let message: Message = serde_json::from_slice(&body).unwrap();
        assert_eq!(message.message, "Student not found");
    }
}
