//! Stateless session tokens.
//!
//! Tokens use the compact JWT form `header.claims.signature`, each segment
//! base64url without padding, signed with HMAC-SHA256 (`HS256`). Nothing is
//! stored server side; expiry is the only invalidation mechanism.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Role;

type HmacSha256 = Hmac<Sha256>;

const ALG_HS256: &str = "HS256";
const TYP_JWT: &str = "JWT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALG_HS256.to_string(),
            typ: TYP_JWT.to_string(),
        }
    }
}

/// Claims carried by a session token.
#[derive(ToSchema, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    Format,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    Key,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn split(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
            Ok((h, c, s))
        }
        _ => Err(TokenError::Format),
    }
}

/// Decode the claims without checking the signature or expiry.
///
/// Clients use this to read the role from a token they just received; the
/// server must always go through [`TokenSigner::verify`].
///
/// # Errors
/// Returns an error if the token is not well formed.
pub fn peek(token: &str) -> Result<SessionClaims, TokenError> {
    let (_, claims_b64, _) = split(token)?;
    b64d_json(claims_b64)
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }

    /// # Errors
    /// Returns an error if the claims cannot be encoded or the key is unusable.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        ))
    }

    /// Verify signature and expiry against `now` (unix seconds).
    ///
    /// # Errors
    /// Returns an error if the token is malformed, tampered with or expired.
    pub fn verify(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        let (header_b64, claims_b64, signature_b64) = split(token)?;

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != ALG_HS256 {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature =
            Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(SecretString::from(secret.to_string()))
    }

    fn claims() -> SessionClaims {
        SessionClaims {
            id: Uuid::now_v7(),
            username: "asha".to_string(),
            role: Role::Faculty,
            iat: NOW,
            exp: NOW + 3600,
        }
    }

    #[test]
    fn sign_and_verify() {
        let signer = signer("s3cret");
        let claims = claims();
        let token = signer.sign(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(signer.verify(&token, NOW + 10).unwrap(), claims);
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer("s3cret");
        let token = signer.sign(&claims()).unwrap();
        assert!(signer.verify(&token, NOW + 3599).is_ok());
        assert!(matches!(
            signer.verify(&token, NOW + 3600),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = signer("s3cret").sign(&claims()).unwrap();
        assert!(matches!(
            signer("other").verify(&token, NOW),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let signer = signer("s3cret");
        let token = signer.sign(&claims()).unwrap();
        let (header, _, signature) = split(&token).unwrap();

        let mut forged = claims();
        forged.role = Role::Management;
        let forged_b64 = b64e_json(&forged).unwrap();
        let forged_token = format!("{header}.{forged_b64}.{signature}");

        assert!(matches!(
            signer.verify(&forged_token, NOW),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let signer = signer("s3cret");
        assert!(matches!(signer.verify("", NOW), Err(TokenError::Format)));
        assert!(matches!(signer.verify("a.b", NOW), Err(TokenError::Format)));
        assert!(matches!(
            signer.verify("a.b.c.d", NOW),
            Err(TokenError::Format)
        ));
        assert!(signer.verify("!!!.###.$$$", NOW).is_err());
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let signer = signer("s3cret");
        let header = b64e_json(&TokenHeader {
            alg: "none".to_string(),
            typ: TYP_JWT.to_string(),
        })
        .unwrap();
        let body = b64e_json(&claims()).unwrap();
        let token = format!("{header}.{body}.c2ln");
        assert!(matches!(
            signer.verify(&token, NOW),
            Err(TokenError::UnsupportedAlg(alg)) if alg == "none"
        ));
    }

    #[test]
    fn peek_reads_claims_without_key() {
        let claims = claims();
        let token = signer("s3cret").sign(&claims).unwrap();
        assert_eq!(peek(&token).unwrap(), claims);
    }
}
