//! Password hashing for admin accounts
//!
//! Argon2id with the crate defaults and a random salt per hash. Hashes are
//! stored in PHC string form, so the parameters travel with the hash.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Check a password against a stored hash.
///
/// A mismatch is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse stored password hash")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

/// Whether a new password is long enough
pub fn is_acceptable(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_and_salted() {
        let first = hash_password("trenirovka-2026").unwrap();
        let second = hash_password("trenirovka-2026").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("trenirovka-2026"));
    }

    #[test]
    fn test_verify() {
        let hash = hash_password("пароль-тренера").unwrap();
        assert!(verify_password("пароль-тренера", &hash).unwrap());
        assert!(!verify_password("пароль", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("secret", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_acceptable_length_counts_chars() {
        assert!(!is_acceptable("short"));
        assert!(is_acceptable("пароль12"));
        assert!(is_acceptable("longenough"));
    }
}
