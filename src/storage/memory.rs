use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Credential, CredentialRepository, NewRefreshToken, RefreshToken, RefreshTokenRepository};
use crate::error::StorageError;

/// Process-local store for tests and local development.
///
/// Same single-row semantics as [`super::PgStore`]: unique token strings and
/// unique emails, updates that return the stored row.
#[derive(Default)]
pub struct InMemoryStore {
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
    credentials: RwLock<HashMap<String, Credential>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.read().await.len()
    }

    pub async fn refresh_tokens_for(&self, subject_id: Uuid) -> Vec<RefreshToken> {
        self.refresh_tokens
            .read()
            .await
            .values()
            .filter(|record| record.subject_id == subject_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn create_refresh_token(
        &self,
        new: NewRefreshToken,
    ) -> Result<RefreshToken, StorageError> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(&new.token) {
            return Err(StorageError::UniqueConstraintViolation(
                "refresh_tokens.token".to_string(),
            ));
        }

        let record = RefreshToken::from(new);
        tokens.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StorageError> {
        Ok(self.refresh_tokens.read().await.get(token).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, StorageError> {
        let mut tokens = self.refresh_tokens.write().await;
        Ok(tokens.get_mut(token).map(|record| {
            record.revoked_at = Some(revoked_at);
            record.updated_at = updated_at;
            record.clone()
        }))
    }

    async fn reset_refresh_tokens(&self) -> Result<(), StorageError> {
        self.refresh_tokens.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl CredentialRepository for InMemoryStore {
    async fn get_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, StorageError> {
        Ok(self.credentials.read().await.get(email).cloned())
    }

    async fn create_credential(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, StorageError> {
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(email) {
            return Err(StorageError::UniqueConstraintViolation(
                "users.email".to_string(),
            ));
        }

        let credential = Credential {
            subject_id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        credentials.insert(email.to_string(), credential.clone());
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_token(token: &str) -> NewRefreshToken {
        let now = Utc::now();
        NewRefreshToken {
            token: token.to_string(),
            subject_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(60),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_token_is_rejected() {
        let store = InMemoryStore::new();
        store.create_refresh_token(new_token("abc")).await.unwrap();

        let result = store.create_refresh_token(new_token("abc")).await;
        assert!(matches!(
            result,
            Err(StorageError::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn revoke_missing_token_returns_none() {
        let store = InMemoryStore::new();
        let now = Utc::now();

        let result = store.revoke_refresh_token("missing", now, now).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        store.create_credential("a@example.com", "hash").await.unwrap();

        let result = store.create_credential("a@example.com", "hash").await;
        assert!(matches!(
            result,
            Err(StorageError::UniqueConstraintViolation(_))
        ));
    }
}
