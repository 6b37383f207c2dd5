/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed JWTs. The verifier pins HS256 and never
/// consults the algorithm declared in the token header, so `none` or any
/// other algorithm is rejected before the signature is even considered.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::{AppError, ConfigError, TokenInvalidReason};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Symmetric HMAC secret used to sign and verify access tokens.
///
/// Built once from configuration and injected into [`crate::auth::AuthService`].
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn new(secret: &[u8]) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Issue an access token for `subject_id` valid for `ttl` from now
///
/// # Errors
/// Returns error if signing fails
pub fn issue_access_token(
    subject_id: Uuid,
    key: &SigningKey,
    ttl: Duration,
) -> Result<String, AppError> {
    let claims = Claims::new(subject_id, Utc::now(), ttl);

    encode(&Header::new(ALGORITHM), &claims, &key.encoding)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token against the current time
pub fn validate_access_token(token: &str, key: &SigningKey) -> Result<Uuid, TokenInvalidReason> {
    validate_access_token_at(token, key, Utc::now())
}

/// Validate an access token as of `now` and return its subject
///
/// Performs no I/O; the outcome depends only on the token, the key and `now`.
pub fn validate_access_token_at(
    token: &str,
    key: &SigningKey,
    now: DateTime<Utc>,
) -> Result<Uuid, TokenInvalidReason> {
    let mut validation = Validation::new(ALGORITHM);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    // The time window is checked against `now` below, without leeway.
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &key.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::InvalidSignature => TokenInvalidReason::SignatureMismatch,
                _ => TokenInvalidReason::Malformed,
            };
            tracing::debug!(error = %e, reason = %reason, "Access token rejected");
            reason
        })?;

    claims.check_window(now)?;
    claims.subject_id()
}
