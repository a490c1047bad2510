//! Registration, login and session-token verification.
//!
//! Passwords are stored as salted Argon2id hashes. A successful login issues
//! a signed token carrying the user's id, username and role; tokens are never
//! persisted and stop verifying once they expire.

pub mod password;
pub mod token;

use chrono::Utc;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::{
    models::{NewUser, Role},
    store::{Store, StoreError},
};

use self::token::{SessionClaims, TokenError, TokenSigner};

/// Default session lifetime (1h).
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 3600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    Conflict,
    #[error("User not found")]
    NotFound,
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("Invalid token")]
    Forbidden(#[source] TokenError),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token signing failed: {0}")]
    Signing(#[source] TokenError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::Conflict,
            other => Self::Store(other),
        }
    }
}

/// Unix seconds, used for token issue and expiry checks.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    Utc::now().timestamp()
}

pub struct AuthService {
    store: Arc<dyn Store>,
    signer: TokenSigner,
    ttl: Duration,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, signer: TokenSigner) -> Self {
        Self {
            store,
            signer,
            ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a user with a hashed password.
    ///
    /// # Errors
    /// `Validation` for blank input, `Conflict` when the username is taken.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        if self.store.find_user(username).await?.is_some() {
            debug!("username already taken");
            return Err(AuthError::Conflict);
        }

        let password_hash = password::hash_password(password)?;

        // the store enforces uniqueness too, covering concurrent registrations
        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "user registered");

        Ok(())
    }

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    /// `NotFound` for an unknown username, `Unauthorized` for a wrong password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .store
            .find_user(username.trim())
            .await?
            .ok_or(AuthError::NotFound)?;

        if !password::verify_password(password, &user.password_hash)? {
            return Err(AuthError::Unauthorized);
        }

        let iat = now_unix_seconds();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            id: user.id,
            username: user.username,
            role: user.role,
            iat,
            exp: iat.saturating_add(ttl),
        };

        let token = self.signer.sign(&claims).map_err(AuthError::Signing)?;

        info!(user_id = %claims.id, "login successful");

        Ok(token)
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    /// `Forbidden` if the token is malformed, tampered with or expired.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.verify_at(token, now_unix_seconds())
    }

    /// # Errors
    /// `Forbidden` if the token is malformed, tampered with or expired at `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims, AuthError> {
        self.signer.verify(token, now).map_err(|err| {
            debug!(error = %err, "token rejected");
            AuthError::Forbidden(err)
        })
    }
}
