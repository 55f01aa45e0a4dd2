//! Password hashing.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::AuthError;

/// Hashes new passwords and checks submitted ones against stored hashes.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password for storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Hashing` if the primitive fails.
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;

    /// Whether `plaintext` matches `stored_hash`.
    fn verify(&self, plaintext: &str, stored_hash: &str) -> bool;
}

/// Argon2id hasher producing PHC strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    /// Create a hasher with the default Argon2id parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Hashing(format!("Password hashing failed: {e}")))
    }

    fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored_hash) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("secret").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn test_salted() {
        let hasher = Argon2Hasher::new();
        assert_ne!(hasher.hash("secret").unwrap(), hasher.hash("secret").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let hasher = Argon2Hasher::new();
        assert!(!hasher.verify("secret", "plaintext-secret"));
        assert!(!hasher.verify("", ""));
    }
}
