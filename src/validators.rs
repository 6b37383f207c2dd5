/// Input validators for account registration

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validate and normalize an email address
///
/// Trims surrounding whitespace and lowercases the address so lookups at
/// login match what was stored at registration.
pub fn parse_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(normalize_email(trimmed))
}

/// Normalization applied to every email before it reaches storage
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_normalized() {
        assert_eq!(
            parse_email("  John@Example.com "),
            Ok("john@example.com".to_string())
        );
    }

    #[test]
    fn invalid_emails_are_rejected() {
        let invalid = vec!["", "a@b", "notanemail", "user@", "@example.com", "user@@example.com"];

        for email in invalid {
            assert!(parse_email(email).is_err(), "should reject: {:?}", email);
        }
    }

    #[test]
    fn overlong_email_is_rejected() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            parse_email(&email),
            Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH))
        );
    }
}
