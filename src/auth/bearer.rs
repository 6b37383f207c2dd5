use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization` header value
///
/// Strict: the exact, case-sensitive `"Bearer "` prefix followed by a
/// non-empty token with no further whitespace. Anything else is rejected.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}
