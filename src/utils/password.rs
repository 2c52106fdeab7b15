use argon2::{
    Argon2,
    password_hash::{PasswordHasher, PasswordVerifier, phc::PasswordHash},
};

use crate::error::{AppError, AppResult};

/// Hashes a secret (account password or email verification code) with Argon2id.
pub fn hash_secret(secret: &str) -> AppResult<String> {
    let hash = Argon2::default()
        .hash_password(secret.as_bytes())
        .map_err(|e| AppError::internal(format!("Failed to hash secret: {e}")))?;
    Ok(hash.to_string())
}

/// Checks `secret` against a stored PHC hash string.
///
/// A malformed stored hash is an internal error; a mismatch is `Ok(false)`.
pub fn verify_secret(secret: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Stored hash is malformed: {e}")))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_argon2() {
        let hash = hash_secret("hunter22").expect("hash");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_matches_only_the_original() {
        let hash = hash_secret("hunter22").expect("hash");
        assert!(verify_secret("hunter22", &hash).unwrap());
        assert!(!verify_secret("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_secret("493021").unwrap();
        let b = hash_secret("493021").unwrap();
        assert_ne!(a, b);
        assert!(verify_secret("493021", &a).unwrap());
        assert!(verify_secret("493021", &b).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_internal_error() {
        assert!(matches!(
            verify_secret("x", "not-a-hash"),
            Err(AppError::Internal { .. })
        ));
    }
}
