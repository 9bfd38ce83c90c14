//! One-time password reset tokens.
//!
//! The plaintext is 32 random bytes, hex-encoded, and is only ever sent to
//! the user. The store keeps its SHA-256 digest and an expiry.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::error::AppError;

pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct ResetToken {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Generates a token valid for [`RESET_TOKEN_TTL_MINUTES`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the system RNG fails.
    pub fn generate(now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut buffer = [0u8; TOKEN_BYTES];
        getrandom::fill(&mut buffer)
            .map_err(|e| AppError::internal(format!("Failed to generate random bytes: {e}")))?;

        let plaintext = hex::encode(buffer);
        Ok(Self {
            hash: hash_reset_token(&plaintext),
            plaintext,
            expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        })
    }
}

/// SHA-256 of the plaintext token, hex-encoded.
pub fn hash_reset_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
