//! Signed session tokens (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;

/// Token payload: the user id plus issue and expiry times in seconds since
/// the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Your session has expired. Please log in again.")]
    Expired,

    #[error("Invalid token. Please log in again.")]
    Invalid,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::forbidden(e.to_string())
    }
}

/// Issues and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issues a token for `user_id` valid from now.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if signing fails.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if signed at `issued_at`.
    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            id: user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Verifies the signature and expiry of `token`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Expired`] when the token is past its expiry
    /// - [`TokenError::Invalid`] for any other failure
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    #[test]
    fn test_issue_and_verify() {
        let tokens = SessionTokens::new(SECRET, 90);
        let id = Uuid::new_v4();

        let token = tokens.issue(id).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.exp - claims.iat, 90 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token() {
        let tokens = SessionTokens::new(SECRET, 90);
        let token = tokens
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::days(91))
            .unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer = SessionTokens::new(SECRET, 90);
        let other = SessionTokens::new("another-secret-that-is-32-bytes-long!!", 90);

        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
        assert_eq!(issuer.verify("garbage"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_token_error_maps_to_forbidden() {
        let err: AppError = TokenError::Expired.into();
        assert!(matches!(err, AppError::Forbidden { .. }));
        assert_eq!(err.to_string(), "Your session has expired. Please log in again.");
    }
}
