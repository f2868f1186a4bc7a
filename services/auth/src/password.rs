//! Credential store: one-way password hashing and verification

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version,
    password_hash::{PasswordHash as PhcString, SaltString},
};
use common::models::PasswordHash;
use tracing::warn;

/// Argon2id cost parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456)
    pub memory_kib: u32,
    /// Number of passes (default: 2)
    pub iterations: u32,
    /// Degree of parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Create a new PasswordConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PASSWORD_HASH_MEMORY_KIB`: Memory cost (default: 19456)
    /// - `PASSWORD_HASH_ITERATIONS`: Time cost (default: 2)
    /// - `PASSWORD_HASH_PARALLELISM`: Lanes (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |name: &str, default: u32| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Self {
            memory_kib: read("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib),
            iterations: read("PASSWORD_HASH_ITERATIONS", defaults.iterations),
            parallelism: read("PASSWORD_HASH_PARALLELISM", defaults.parallelism),
        }
    }
}

/// Hashes and verifies passwords with Argon2id
#[derive(Debug, Clone)]
pub struct CredentialStore {
    params: Params,
    /// Hash checked when the account does not exist, so unknown logins
    /// cost the same Argon2 work as known ones
    decoy: PasswordHash,
}

impl CredentialStore {
    /// Build a credential store, rejecting cost parameters argon2 would refuse
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid password hashing parameters: {}", e))?;

        let mut store = Self {
            params,
            decoy: PasswordHash::from_phc(String::new()),
        };
        store.decoy = store.hash_password("decoy-password-never-matches")?;
        Ok(store)
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash_password(&self, plaintext: &str) -> Result<PasswordHash> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let encoded = self
            .hasher()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        Ok(PasswordHash::from_phc(encoded))
    }

    /// Check a plaintext password against a stored hash
    ///
    /// Returns `false` for a wrong password and for a stored value that is not
    /// a valid PHC string; it never errors.
    pub fn verify_password(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        let parsed = match PhcString::new(hash.as_str()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                return false;
            }
        };

        self.hasher()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one verification on the decoy hash for a login that matched
    /// no account
    pub fn verify_absent_account(&self, plaintext: &str) {
        let _ = self.verify_password(plaintext, &self.decoy);
    }
}

#[cfg(test)]
pub(crate) fn test_credentials() -> CredentialStore {
    CredentialStore::new(&PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .expect("minimal argon2 parameters are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoy_is_a_real_argon2_hash() {
        let credentials = test_credentials();
        assert!(credentials.decoy.as_str().starts_with("$argon2id$"));
        assert!(PhcString::new(credentials.decoy.as_str()).is_ok());
        credentials.verify_absent_account("anything");
    }

    #[test]
    fn test_hash_then_verify_accepts_same_password() {
        let credentials = test_credentials();
        let hash = credentials.hash_password("Correct-Horse-1").unwrap();

        assert!(credentials.verify_password("Correct-Horse-1", &hash));
        assert!(!credentials.verify_password("Correct-Horse-2", &hash));
        assert!(!credentials.verify_password("", &hash));
    }

    #[test]
    fn test_hash_is_salted_and_never_plaintext() {
        let credentials = test_credentials();
        let first = credentials.hash_password("Secret-Pass-9").unwrap();
        let second = credentials.hash_password("Secret-Pass-9").unwrap();

        assert_ne!(first, second);
        assert!(first.as_str().starts_with("$argon2id$"));
        assert!(!first.as_str().contains("Secret-Pass-9"));
    }

    #[test]
    fn test_garbage_hash_verifies_false() {
        let credentials = test_credentials();
        let garbage = PasswordHash::from_phc("not-a-phc-string".to_string());
        assert!(!credentials.verify_password("anything", &garbage));
    }

    #[test]
    fn test_invalid_cost_parameters_are_rejected() {
        let result = CredentialStore::new(&PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }
}
