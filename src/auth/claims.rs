/// Access token claim set
///
/// Registered claims only (RFC 7519): issuer, subject, issued-at and expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenInvalidReason;

/// Fixed issuer label carried by every access token
pub const ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for `subject_id`, valid from `issued_at` for `ttl`
    pub fn new(subject_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();
        Self {
            iss: ISSUER.to_string(),
            sub: subject_id.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    pub fn subject_id(&self) -> Result<Uuid, TokenInvalidReason> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenInvalidReason::InvalidSubject)
    }

    /// Check the inclusive `[iat, exp]` window against `now`
    pub fn check_window(&self, now: DateTime<Utc>) -> Result<(), TokenInvalidReason> {
        let now = now.timestamp();
        if now > self.exp {
            return Err(TokenInvalidReason::Expired);
        }
        if now < self.iat {
            return Err(TokenInvalidReason::NotYetValid);
        }
        Ok(())
    }
}
