//! Argon2 hashing for passwords and one-time codes.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use cyberguard_common::{AppError, AppResult};

/// Hash a secret into a PHC string.
pub fn hash_secret(secret: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash secret: {e}")))
}

/// Verify a secret against a PHC string.
pub fn verify_secret(secret: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("correct horse", &hash).unwrap());
        assert!(!verify_secret("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_secret("123456").unwrap(), hash_secret("123456").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_secret("x", "not-a-phc-string").is_err());
    }
}
