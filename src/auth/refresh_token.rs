/// Refresh Token Management
///
/// Refresh tokens are opaque 256-bit random strings, persisted one row per
/// grant. A row is only ever mutated to mark it revoked, and revocation is
/// permanent regardless of `expires_at`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::configuration::Platform;
use crate::error::{AppError, AuthError, RefreshRejection};
use crate::storage::{NewRefreshToken, RefreshToken, RefreshTokenRepository};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Lifetime of every refresh token
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

pub fn refresh_token_ttl() -> Duration {
    Duration::days(REFRESH_TOKEN_TTL_DAYS)
}

/// Generate a new refresh token: 32 bytes from the OS CSPRNG, hex encoded
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Lifecycle state of a stored refresh token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Expired,
    Revoked,
}

impl TokenState {
    pub fn rejection(self) -> Option<RefreshRejection> {
        match self {
            TokenState::Active => None,
            TokenState::Expired => Some(RefreshRejection::Expired),
            TokenState::Revoked => Some(RefreshRejection::Revoked),
        }
    }
}

impl RefreshToken {
    /// Expiry is checked before revocation.
    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if now > self.expires_at {
            TokenState::Expired
        } else if self.revoked_at.is_some() {
            TokenState::Revoked
        } else {
            TokenState::Active
        }
    }
}

/// Refresh token operations over a [`RefreshTokenRepository`]
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repository }
    }

    /// Persist a freshly generated token for `subject_id`
    ///
    /// # Errors
    /// Returns a storage error if the row could not be written; callers must
    /// not hand the token out in that case.
    pub async fn persist(
        &self,
        subject_id: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<RefreshToken, AppError> {
        let now = Utc::now();
        let record = self
            .repository
            .create_refresh_token(NewRefreshToken {
                token: token.to_string(),
                subject_id,
                created_at: now,
                updated_at: now,
                expires_at: now + ttl,
                revoked_at: None,
            })
            .await?;

        tracing::debug!(
            user_id = %subject_id,
            expires_at = %record.expires_at,
            "Refresh token persisted"
        );
        Ok(record)
    }

    /// Fetch a stored token by exact match
    pub async fn lookup(&self, token: &str) -> Result<RefreshToken, AppError> {
        self.repository
            .get_refresh_token(token)
            .await?
            .ok_or_else(|| RefreshRejection::NotFound.into())
    }

    /// Mark a token revoked
    ///
    /// Re-revoking is not an error: `revoked_at` and `updated_at` are
    /// overwritten with the current time and the token stays revoked.
    pub async fn revoke(&self, token: &str) -> Result<RefreshToken, AppError> {
        let now = Utc::now();
        let record = self
            .repository
            .revoke_refresh_token(token, now, now)
            .await?
            .ok_or(RefreshRejection::NotFound)?;

        tracing::info!(user_id = %record.subject_id, "Refresh token revoked");
        Ok(record)
    }

    /// Delete every refresh token. Only permitted on the `dev` platform.
    pub async fn reset(&self, platform: Platform) -> Result<(), AppError> {
        if !platform.is_dev() {
            tracing::warn!(platform = ?platform, "Refused refresh token reset");
            return Err(AuthError::Forbidden(
                "reset is only allowed on the dev platform".to_string(),
            )
            .into());
        }

        self.repository.reset_refresh_tokens().await?;
        tracing::warn!("All refresh tokens deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn store() -> (Arc<InMemoryStore>, RefreshTokenStore) {
        let memory = Arc::new(InMemoryStore::new());
        let store = RefreshTokenStore::new(memory.clone());
        (memory, store)
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        // 32 bytes, hex encoded
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[test]
    fn test_state_ordering() {
        let now = Utc::now();
        let mut record = RefreshToken {
            token: generate_refresh_token(),
            subject_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(1),
            revoked_at: None,
        };
        assert_eq!(record.state(now), TokenState::Active);

        record.revoked_at = Some(now);
        assert_eq!(record.state(now), TokenState::Revoked);

        assert_eq!(record.state(now + Duration::days(2)), TokenState::Expired);
    }

    #[tokio::test]
    async fn persist_then_lookup() {
        let (_, store) = store();
        let subject = Uuid::new_v4();
        let token = generate_refresh_token();

        let saved = store.persist(subject, &token, refresh_token_ttl()).await.unwrap();
        assert!(saved.revoked_at.is_none());
        assert_eq!(saved.expires_at - saved.created_at, Duration::days(60));

        let found = store.lookup(&token).await.unwrap();
        assert_eq!(found, saved);
    }

    #[tokio::test]
    async fn lookup_unknown_token_is_not_found() {
        let (_, store) = store();

        let err = store.lookup("nope").await.unwrap_err();
        assert_eq!(
            err.as_auth(),
            Some(&AuthError::RefreshTokenRejected(RefreshRejection::NotFound))
        );
    }

    #[tokio::test]
    async fn revoke_twice_keeps_token_revoked() {
        let (_, store) = store();
        let token = generate_refresh_token();
        store.persist(Uuid::new_v4(), &token, refresh_token_ttl()).await.unwrap();

        let first = store.revoke(&token).await.unwrap();
        let second = store.revoke(&token).await.unwrap();

        let first_at = first.revoked_at.unwrap();
        let second_at = second.revoked_at.unwrap();
        assert!(second_at >= first_at);
        assert_eq!(second.updated_at, second_at);
        assert_eq!(store.lookup(&token).await.unwrap().state(Utc::now()), TokenState::Revoked);
    }

    #[tokio::test]
    async fn revoke_unknown_token_is_not_found() {
        let (_, store) = store();

        let err = store.revoke("nope").await.unwrap_err();
        assert_eq!(
            err.as_auth(),
            Some(&AuthError::RefreshTokenRejected(RefreshRejection::NotFound))
        );
    }

    #[tokio::test]
    async fn reset_requires_dev_platform() {
        let (memory, store) = store();
        store
            .persist(Uuid::new_v4(), &generate_refresh_token(), refresh_token_ttl())
            .await
            .unwrap();

        let err = store.reset(Platform::Production).await.unwrap_err();
        assert!(matches!(err.as_auth(), Some(AuthError::Forbidden(_))));
        assert_eq!(memory.refresh_token_count().await, 1);

        store.reset(Platform::Dev).await.unwrap();
        assert_eq!(memory.refresh_token_count().await, 0);
    }
}
