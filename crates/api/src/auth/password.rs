//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Verify a password against a stored hash.
///
/// A hash that fails to parse counts as a failed verification rather than an
/// error: a garbled row in the database must not turn a login attempt into a
/// 500, and callers treat every non-match identically.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("verify_password: stored hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "pw123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let password = "pw123";
        let first = hash_password(password).expect("Failed to hash password");
        let second = hash_password(password).expect("Failed to hash password");

        // Random salt: distinct hashes, both verify
        assert_ne!(first, second);
        assert!(verify_password(password, &first));
        assert!(verify_password(password, &second));
    }

    #[test]
    fn test_malformed_hash_fails_quietly() {
        assert!(!verify_password("pw123", "not-a-phc-string"));
        assert!(!verify_password("pw123", ""));
    }
}
