use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::config::HashConfig;

/// Password used to build the decoy digest for unknown-account logins.
const DECOY_PASSWORD: &str = "decoy-password-never-matches";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid password hash parameters: {0}")]
    Params(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Salted, cost-parameterized password digests (argon2id, PHC strings).
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    decoy: String,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    pub fn new(cfg: HashConfig) -> Result<Self, PasswordError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| PasswordError::Params(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut hasher = Self {
            argon2,
            decoy: String::new(),
        };
        hasher.decoy = hasher.hash(DECOY_PASSWORD)?;
        Ok(hasher)
    }

    /// Hashes `plain` with a fresh random salt.
    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Checks `plain` against a stored digest using the salt and parameters
    /// embedded in it. A malformed digest simply does not match.
    pub fn verify(&self, plain: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Spends the same work as a real verification against a digest that
    /// never matches. Always returns false.
    pub fn verify_decoy(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.decoy);
        false
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> HashConfig {
    HashConfig {
        memory_kib: 256,
        iterations: 1,
        parallelism: 1,
    }
}
