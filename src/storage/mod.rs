/// Storage collaborators
///
/// The credential lifecycle needs only the operations below from persistence.
/// Each call is a single atomic statement; nothing here opens a transaction.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StorageError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// A persisted refresh token row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub subject_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Insert payload for a refresh token row
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token: String,
    pub subject_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<NewRefreshToken> for RefreshToken {
    fn from(new: NewRefreshToken) -> Self {
        Self {
            token: new.token,
            subject_id: new.subject_id,
            created_at: new.created_at,
            updated_at: new.updated_at,
            expires_at: new.expires_at,
            revoked_at: new.revoked_at,
        }
    }
}

/// Login material for one account. `password_hash` is never logged.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Credential {
    pub subject_id: Uuid,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("subject_id", &self.subject_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create_refresh_token(&self, new: NewRefreshToken)
        -> Result<RefreshToken, StorageError>;

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StorageError>;

    /// Set `revoked_at`/`updated_at`; `None` when no row matches
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, StorageError>;

    async fn reset_refresh_tokens(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn get_credential_by_email(&self, email: &str)
        -> Result<Option<Credential>, StorageError>;

    async fn create_credential(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, StorageError>;
}
