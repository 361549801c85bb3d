//! Argon2id password hashing
//!
//! Digests are PHC strings, so the salt and cost parameters travel with
//! the hash and old digests keep verifying after a cost change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashCost;
use crate::error::{CatalogError, Result};

/// Salted, adaptive-cost one-way password hasher
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(cost: HashCost) -> Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CatalogError::Config(format!("invalid Argon2 cost: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `plaintext` with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CatalogError::Hashing(e.to_string()))
    }

    /// Check `plaintext` against a stored digest
    ///
    /// Any mismatch, including a digest that does not parse, is `false`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// [`CredentialHasher::hash`] on the blocking pool
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| CatalogError::Hashing(format!("hashing task failed: {e}")))?
    }

    /// [`CredentialHasher::verify`] on the blocking pool
    pub async fn verify_blocking(&self, plaintext: String, digest: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> CredentialHasher {
        CredentialHasher::new(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = cheap();
        let digest = hasher.hash("hunter2").unwrap();
        assert_ne!(digest, "hunter2");
        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter2", &digest));
        assert!(!hasher.verify("hunter3", &digest));
        assert!(!hasher.verify("", &digest));
    }

    #[test]
    fn test_salt_differs_per_call() {
        let hasher = cheap();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same", &a));
        assert!(hasher.verify("same", &b));
    }

    #[test]
    fn test_malformed_digest_is_false() {
        let hasher = cheap();
        assert!(!hasher.verify("pw", "not-a-phc-string"));
        assert!(!hasher.verify("pw", ""));
    }

    #[test]
    fn test_digest_verifies_under_other_cost() {
        let digest = cheap().hash("portable").unwrap();
        let stronger = CredentialHasher::new(HashCost {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify("portable", &digest));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let result = CredentialHasher::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = cheap();
        let digest = hasher.hash_blocking("async-pw".into()).await.unwrap();
        assert!(hasher.verify_blocking("async-pw".into(), digest.clone()).await);
        assert!(!hasher.verify_blocking("nope".into(), digest).await);
    }
}
