/// Authentication Service
///
/// Orchestrates the credential lifecycle: login issues an access/refresh
/// pair, refresh mints a new access token from a stored refresh token, and
/// logout revokes the refresh token. All configuration is injected at
/// construction; nothing here reads process globals.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::bearer::extract_bearer;
use crate::auth::jwt::{issue_access_token, validate_access_token, SigningKey};
use crate::auth::password::{
    hash_password, reject_unknown_account, validate_password_strength, verify_password,
};
use crate::auth::refresh_token::{generate_refresh_token, refresh_token_ttl, RefreshTokenStore};
use crate::configuration::{Platform, Settings};
use crate::error::{AppError, AuthError, ConfigError};
use crate::storage::{Credential, CredentialRepository, RefreshTokenRepository};
use crate::validators::{normalize_email, parse_email};

/// Tokens handed to a client after a successful login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub subject_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialRepository>,
    refresh_tokens: RefreshTokenStore,
    signing_key: SigningKey,
    access_token_ttl: Duration,
    platform: Platform,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        signing_key: SigningKey,
        access_token_ttl: Duration,
        platform: Platform,
    ) -> Self {
        Self {
            credentials,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens),
            signing_key,
            access_token_ttl,
            platform,
        }
    }

    /// Build a service over one store that implements both repositories
    pub fn from_settings<S>(store: Arc<S>, settings: &Settings) -> Result<Self, ConfigError>
    where
        S: CredentialRepository + RefreshTokenRepository + 'static,
    {
        Ok(Self::new(
            store.clone(),
            store,
            settings.jwt.signing_key()?,
            settings.jwt.access_token_ttl()?,
            settings.application.platform,
        ))
    }

    /// Create an account with a bcrypt-hashed password
    ///
    /// # Errors
    /// - Validation error for a bad email or weak password
    /// - `UniqueConstraintViolation` if the email is already registered
    pub async fn register(&self, email: &str, password: &str) -> Result<Credential, AppError> {
        let email = parse_email(email)?;
        validate_password_strength(password)?;
        let password_hash = hash_password(password)?;

        let credential = self
            .credentials
            .create_credential(&email, &password_hash)
            .await?;

        tracing::info!(user_id = %credential.subject_id, "Account registered");
        Ok(credential)
    }

    /// Verify a password and issue a new access/refresh pair
    ///
    /// Unknown email, wrong password and an unreadable stored hash all yield
    /// `AuthError::InvalidCredentials`. The pair is returned only once the
    /// refresh token row has been written.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);

        let credential = match self.credentials.get_credential_by_email(&email).await? {
            Some(credential) => credential,
            None => {
                let reason = reject_unknown_account(password);
                tracing::info!(reason = %reason, "Login attempt for unknown account");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if let Err(e) = verify_password(password, &credential.password_hash) {
            tracing::info!(user_id = %credential.subject_id, reason = %e, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token =
            issue_access_token(credential.subject_id, &self.signing_key, self.access_token_ttl)?;
        let refresh_token = generate_refresh_token();
        self.refresh_tokens
            .persist(credential.subject_id, &refresh_token, refresh_token_ttl())
            .await?;

        tracing::info!(user_id = %credential.subject_id, "User logged in");

        Ok(TokenPair {
            subject_id: credential.subject_id,
            email: credential.email,
            access_token,
            refresh_token,
            expires_in: self.access_token_ttl.num_seconds(),
        })
    }

    /// Mint a new access token from a stored refresh token
    ///
    /// The refresh token itself is neither rotated nor extended.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let record = self.refresh_tokens.lookup(refresh_token).await?;

        if let Some(rejection) = record.state(Utc::now()).rejection() {
            tracing::warn!(
                user_id = %record.subject_id,
                reason = %rejection,
                "Refresh token rejected"
            );
            return Err(rejection.into());
        }

        let access_token =
            issue_access_token(record.subject_id, &self.signing_key, self.access_token_ttl)?;
        tracing::info!(user_id = %record.subject_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a refresh token. Succeeds even if it was already revoked.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        self.refresh_tokens.revoke(refresh_token).await?;
        Ok(())
    }

    /// Resolve the subject of a request from its `Authorization` header
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Uuid, AppError> {
        let token = extract_bearer(authorization)?;
        let subject_id = validate_access_token(token, &self.signing_key)?;
        Ok(subject_id)
    }

    /// Delete all refresh tokens; forbidden outside the dev platform
    pub async fn reset(&self) -> Result<(), AppError> {
        self.refresh_tokens.reset(self.platform).await
    }
}
