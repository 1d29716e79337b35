//! Password hashing and session token generation
//!
//! Passwords are stored as `hex(SHA-256^n(salt || password))` with a random
//! per-user salt. Session tokens are 32 random bytes, hex encoded.
//!
//! # Pure Functions
//!
//! No HTTP framework or database dependencies; the service crate owns the
//! `users` and `sessions` tables.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Number of SHA-256 rounds applied to each password
pub const PASSWORD_HASH_ROUNDS: u32 = 10_000;

/// Minimum accepted password length (characters)
pub const MIN_PASSWORD_LEN: usize = 8;

/// Salt length in bytes (hex-encoded to twice this)
const SALT_BYTES: usize = 16;

/// Session token length in bytes (hex-encoded to twice this)
const TOKEN_BYTES: usize = 32;

/// Credential validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Password shorter than [`MIN_PASSWORD_LEN`]
    PasswordTooShort { min: usize },

    /// Username or password did not match
    InvalidCredentials,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::PasswordTooShort { min } => {
                write!(f, "Password must be at least {} characters", min)
            }
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Generate a random hex salt
pub fn generate_salt() -> String {
    random_hex(SALT_BYTES)
}

/// Generate a random hex session token
pub fn generate_session_token() -> String {
    random_hex(TOKEN_BYTES)
}

/// Generate a random password for bootstrap accounts
///
/// 16 hex characters; long enough for [`MIN_PASSWORD_LEN`].
pub fn generate_password() -> String {
    random_hex(8)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Check password policy
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Hash a password with the given salt
///
/// # Examples
///
/// ```
/// use cmc_common::api::auth::hash_password;
///
/// let hash = hash_password("correct horse", "abcd");
/// assert_eq!(hash.len(), 64); // SHA-256 is 64 hex chars
/// assert_eq!(hash, hash_password("correct horse", "abcd"));
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();

    for _ in 1..PASSWORD_HASH_ROUNDS {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt.as_bytes())
            .finalize();
    }

    to_hex(&digest)
}

/// Verify a password against a stored hash and salt
///
/// Comparison is constant-time; a length mismatch is simply unequal.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let calculated = hash_password(password, salt);
    bool::from(calculated.as_bytes().ct_eq(stored_hash.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let h1 = hash_password("s3cretpass", "salt-a");
        let h2 = hash_password("s3cretpass", "salt-a");
        let h3 = hash_password("s3cretpass", "salt-b");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_password() {
        let salt = generate_salt();
        let stored = hash_password("s3cretpass", &salt);

        assert!(verify_password("s3cretpass", &salt, &stored));
        assert!(!verify_password("s3cretpasS", &salt, &stored));
        assert!(!verify_password("", &salt, &stored));
    }

    #[test]
    fn test_verify_rejects_truncated_hash() {
        let salt = generate_salt();
        let stored = hash_password("s3cretpass", &salt);
        assert!(!verify_password("s3cretpass", &salt, &stored[..32]));
        assert!(!verify_password("s3cretpass", &salt, ""));
    }

    #[test]
    fn test_verify_rejects_single_flipped_digit() {
        let salt = generate_salt();
        let stored = hash_password("s3cretpass", &salt);
        let last = if stored.ends_with('0') { '1' } else { '0' };
        let tampered = format!("{}{}", &stored[..63], last);
        assert!(!verify_password("s3cretpass", &salt, &tampered));
    }

    #[test]
    fn test_generated_values_are_random_hex() {
        let t1 = generate_session_token();
        let t2 = generate_session_token();
        assert_eq!(t1.len(), 64);
        assert_ne!(t1, t2);

        assert_eq!(generate_salt().len(), 32);

        let password = generate_password();
        assert!(validate_password(&password).is_ok());
    }

    #[test]
    fn test_password_policy() {
        assert_eq!(
            validate_password("short"),
            Err(AuthError::PasswordTooShort { min: 8 })
        );
        assert!(validate_password("long enough").is_ok());
    }
}
