use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Credential, CredentialRepository, NewRefreshToken, RefreshToken, RefreshTokenRepository};
use crate::error::StorageError;

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RefreshTokenRepository for PgStore {
    async fn create_refresh_token(
        &self,
        new: NewRefreshToken,
    ) -> Result<RefreshToken, StorageError> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING token, user_id AS subject_id, created_at, updated_at, expires_at, revoked_at
            "#,
        )
        .bind(&new.token)
        .bind(new.created_at)
        .bind(new.updated_at)
        .bind(new.subject_id)
        .bind(new.expires_at)
        .bind(new.revoked_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StorageError> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token, user_id AS subject_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, StorageError> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2, updated_at = $3
            WHERE token = $1
            RETURNING token, user_id AS subject_id, created_at, updated_at, expires_at, revoked_at
            "#,
        )
        .bind(token)
        .bind(revoked_at)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn reset_refresh_tokens(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialRepository for PgStore {
    async fn get_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, StorageError> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            SELECT id AS subject_id, email, hashed_password AS password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    async fn create_credential(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, StorageError> {
        let now = Utc::now();
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id AS subject_id, email, hashed_password AS password_hash
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(now)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(credential)
    }
}
