use secrecy::{ExposeSecret, SecretString};

use crate::auth::token::{self, SessionClaims, TokenError};

/// Token held by a client after login, with its decoded claims.
///
/// Claims are read without verifying the signature; the server remains the
/// authority on whether a token is still accepted.
#[derive(Clone, Debug)]
pub struct Session {
    token: SecretString,
    claims: SessionClaims,
}

impl Session {
    /// # Errors
    /// Returns an error if the token is not a well-formed compact token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, TokenError> {
        let token = token.into();
        let claims = token::peek(&token)?;
        Ok(Self {
            token: SecretString::from(token),
            claims,
        })
    }

    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    #[must_use]
    pub const fn claims(&self) -> &SessionClaims {
        &self.claims
    }

    /// Landing route for the signed-in role.
    #[must_use]
    pub const fn home_path(&self) -> &'static str {
        self.claims.role.home_path()
    }

    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        self.claims.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::token::TokenSigner, models::Role};
    use uuid::Uuid;

    fn token_for(role: Role) -> String {
        let signer = TokenSigner::new(SecretString::from("client-secret".to_string()));
        signer
            .sign(&SessionClaims {
                id: Uuid::now_v7(),
                username: "asha".to_string(),
                role,
                iat: 1_000,
                exp: 4_600,
            })
            .unwrap()
    }

    #[test]
    fn decodes_claims_and_landing_route() {
        let session = Session::from_token(token_for(Role::Faculty)).unwrap();
        assert_eq!(session.claims().username, "asha");
        assert_eq!(session.home_path(), "/faculty");

        let session = Session::from_token(token_for(Role::Management)).unwrap();
        assert_eq!(session.home_path(), "/management");
    }

    #[test]
    fn expiry_follows_claims() {
        let session = Session::from_token(token_for(Role::Student)).unwrap();
        assert!(!session.is_expired_at(4_599));
        assert!(session.is_expired_at(4_600));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Session::from_token("not-a-token").is_err());
    }
}
