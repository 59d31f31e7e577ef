//! One-way credential hashing.
//!
//! Argon2id with a configurable iteration cost. Digests are PHC strings, so
//! verification reads the parameters back from the digest itself and keeps
//! working after the configured cost changes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

/// Lowest accepted iteration cost.
pub const MIN_HASH_COST: u32 = 2;

/// Default iteration cost.
pub const DEFAULT_HASH_COST: u32 = 3;

/// Default memory cost in KiB (19 MiB).
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19_456;

/// Failures inside the hashing transform.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Hashing failure: {0}")]
    Failure(String),
}

/// Password hasher backed by Argon2id.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Create a hasher. Costs below [`MIN_HASH_COST`] are raised to the floor.
    pub fn new(cost: u32, memory_kib: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, cost.max(MIN_HASH_COST), 1, None)
            .map_err(|e| HashError::Failure(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a PHC-formatted digest with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| HashError::Failure(e.to_string()))
    }

    /// Check a password against a digest.
    ///
    /// Returns `false` for any mismatch, including digests that do not parse.
    /// The final comparison is constant-time.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("cost", &self.argon2.params().t_cost())
            .field("memory_kib", &self.argon2.params().m_cost())
            .finish()
    }
}
