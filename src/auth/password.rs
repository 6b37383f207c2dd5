/// Password Hashing and Verification
///
/// bcrypt hashing, verification, and the strength policy applied at registration.

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::error::{CredentialError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // Same cost as real account hashes
    static ref UNKNOWN_ACCOUNT_HASH: Option<String> =
        hash("unknown-account-placeholder", DEFAULT_COST).ok();
}

/// Hash a password using bcrypt with a random salt
///
/// # Errors
/// Returns `HashingFailure` if bcrypt cannot produce a hash
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    hash(password, DEFAULT_COST).map_err(|e| CredentialError::HashingFailure(e.to_string()))
}

/// Verify a password against its bcrypt hash
///
/// The digest comparison is constant-time inside bcrypt.
///
/// # Errors
/// - `Mismatch` if the password is wrong
/// - `MalformedHash` if `hash` is not a parseable bcrypt string
pub fn verify_password(password: &str, hash: &str) -> Result<(), CredentialError> {
    match verify(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CredentialError::Mismatch),
        Err(
            BcryptError::InvalidHash(_)
            | BcryptError::InvalidPrefix(_)
            | BcryptError::InvalidCost(_)
            | BcryptError::InvalidBase64(_),
        ) => Err(CredentialError::MalformedHash),
        Err(e) => Err(CredentialError::HashingFailure(e.to_string())),
    }
}

/// Spend one bcrypt verification on a login for an account that does not exist
///
/// Keeps the miss path as slow as a wrong password. Never succeeds: the
/// returned error is what the verification produced, or `Mismatch`.
pub fn reject_unknown_account(password: &str) -> CredentialError {
    match UNKNOWN_ACCOUNT_HASH.as_deref() {
        Some(hash) => match verify_password(password, hash) {
            Ok(()) => CredentialError::Mismatch,
            Err(e) => e,
        },
        None => match hash_password(password) {
            Ok(_) => CredentialError::Mismatch,
            Err(e) => e,
        },
    }
}

/// Validate password strength requirements
///
/// Requirements:
/// - 8 to 128 characters
/// - At least one digit, one lowercase letter, and one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    // bcrypt truncates long input; cap it well below DoS territory
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat("password".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("ValidPassword123").unwrap();
        let second = hash_password("ValidPassword123").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_eq!(verify_password(password, &hash), Ok(()));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("ValidPassword123").expect("Failed to hash password");

        assert_eq!(
            verify_password("WrongPassword123", &hash),
            Err(CredentialError::Mismatch)
        );
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert_eq!(
            verify_password("ValidPassword123", "not-a-bcrypt-hash"),
            Err(CredentialError::MalformedHash)
        );
    }

    #[test]
    fn test_unknown_account_runs_a_real_verification() {
        let hash = UNKNOWN_ACCOUNT_HASH
            .as_deref()
            .expect("placeholder hash should be computed");
        assert!(hash.starts_with(&format!("$2b${:02}$", DEFAULT_COST)));

        // A parseable hash means bcrypt did the full work and reported a mismatch
        assert_eq!(
            reject_unknown_account("ValidPassword123"),
            CredentialError::Mismatch
        );
        assert_eq!(
            reject_unknown_account("unknown-account-placeholder"),
            CredentialError::Mismatch
        );
    }

    #[test]
    fn test_strength_rules() {
        assert!(validate_password_strength("ValidPassword123").is_ok());
        assert!(validate_password_strength("Short1").is_err());
        assert!(validate_password_strength(&("a".repeat(MAX_PASSWORD_LENGTH) + "A1")).is_err());
        assert!(validate_password_strength("NoDigitsPassword").is_err());
        assert!(validate_password_strength("NOLOWERCASE1").is_err());
        assert!(validate_password_strength("nouppercase1").is_err());
    }
}
