//! Password hashing with Argon2id.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::error::AppError;

/// Memory cost in KiB (19 MiB).
const MEMORY_COST_KIB: u32 = 19_456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// Hashes and verifies passwords.
///
/// Hashing is CPU-bound and runs on the blocking thread pool so request
/// tasks are not stalled. Each hash uses a fresh random salt and is encoded
/// in PHC string format.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hashes `password` with a per-call salt.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if hashing fails or the blocking task panics.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let argon2 = self.argon2.clone();
        let password = password.to_string();

        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
        })
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
    }

    /// Checks `candidate` against a stored PHC hash. A malformed hash never
    /// verifies.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the blocking task panics.
    pub async fn verify(&self, candidate: &str, hashed: &str) -> Result<bool, AppError> {
        let argon2 = self.argon2.clone();
        let candidate = candidate.to_string();
        let hashed = hashed.to_string();

        task::spawn_blocking(move || match PasswordHash::new(&hashed) {
            Ok(parsed) => argon2.verify_password(candidate.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}
