//! Refresh token and credential persistence against a real Postgres database

use std::net::TcpListener;
use std::sync::Arc;

use chirpy_auth::auth::{generate_refresh_token, refresh_token_ttl, AuthService, RefreshTokenStore};
use chirpy_auth::configuration::{get_configuration, DatabaseSettings, Platform};
use chirpy_auth::error::{AppError, AuthError, RefreshRejection, StorageError};
use chirpy_auth::startup::run;
use chirpy_auth::storage::{CredentialRepository, PgStore};
use serde_json::json;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

pub struct TestApp {
    pub store: Arc<PgStore>,
    pub auth: AuthService,
}

async fn spawn_store() -> TestApp {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    configuration.application.platform = Platform::Dev;
    let connection_pool = configure_database(&configuration.database).await;

    let store = Arc::new(PgStore::new(connection_pool));
    let auth = AuthService::from_settings(store.clone(), &configuration)
        .expect("Failed to build auth service");

    TestApp { store, auth }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

impl TestApp {
    fn refresh_tokens(&self) -> RefreshTokenStore {
        RefreshTokenStore::new(self.store.clone())
    }

    async fn subject(&self, email: &str) -> Uuid {
        self.store
            .create_credential(email, "$2b$12$placeholderplaceholderplaceholderplaceholderpla")
            .await
            .expect("Failed to insert user")
            .subject_id
    }

    async fn refresh_token_rows(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM refresh_tokens")
            .fetch_one(self.store.pool())
            .await
            .expect("Failed to count refresh tokens")
    }
}

fn rejection(err: &AppError) -> Option<RefreshRejection> {
    match err.as_auth() {
        Some(AuthError::RefreshTokenRejected(r)) => Some(*r),
        _ => None,
    }
}

#[tokio::test]
async fn persisted_token_is_found_by_exact_match() {
    let app = spawn_store().await;
    let subject_id = app.subject("john@example.com").await;
    let token = generate_refresh_token();

    let saved = app
        .refresh_tokens()
        .persist(subject_id, &token, refresh_token_ttl())
        .await
        .expect("Failed to persist refresh token");
    let found = app.refresh_tokens().lookup(&token).await.unwrap();

    assert_eq!(found.token, token);
    assert_eq!(found.subject_id, subject_id);
    assert_eq!(found.revoked_at, None);
    assert_eq!(found.expires_at, saved.expires_at);
    assert!(found.expires_at > found.created_at);
    assert_eq!(app.refresh_token_rows().await, 1);

    let unknown = app.refresh_tokens().lookup(&generate_refresh_token()).await;
    assert_eq!(rejection(&unknown.unwrap_err()), Some(RefreshRejection::NotFound));
}

#[tokio::test]
async fn revoke_marks_the_row_and_can_be_repeated() {
    let app = spawn_store().await;
    let subject_id = app.subject("john@example.com").await;
    let token = generate_refresh_token();
    app.refresh_tokens()
        .persist(subject_id, &token, refresh_token_ttl())
        .await
        .unwrap();

    let first = app.refresh_tokens().revoke(&token).await.unwrap();
    let first_revoked_at = first.revoked_at.expect("revoked_at should be set");

    let second = app.refresh_tokens().revoke(&token).await.unwrap();
    let second_revoked_at = second.revoked_at.expect("revoked_at should stay set");

    assert!(second_revoked_at >= first_revoked_at);
    assert!(second.updated_at >= first.updated_at);

    let stored = app.refresh_tokens().lookup(&token).await.unwrap();
    assert!(stored.revoked_at.is_some());
}

#[tokio::test]
async fn revoke_of_unknown_token_is_not_found() {
    let app = spawn_store().await;

    let err = app
        .refresh_tokens()
        .revoke(&generate_refresh_token())
        .await
        .unwrap_err();

    assert_eq!(rejection(&err), Some(RefreshRejection::NotFound));
}

#[tokio::test]
async fn reset_deletes_every_refresh_token() {
    let app = spawn_store().await;
    let first = app.subject("john@example.com").await;
    let second = app.subject("jane@example.com").await;
    for subject_id in [first, first, second] {
        app.refresh_tokens()
            .persist(subject_id, &generate_refresh_token(), refresh_token_ttl())
            .await
            .unwrap();
    }
    assert_eq!(app.refresh_token_rows().await, 3);

    app.refresh_tokens().reset(Platform::Dev).await.unwrap();
    assert_eq!(app.refresh_token_rows().await, 0);

    let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(app.store.pool())
        .await
        .unwrap();
    assert_eq!(users, 2);
}

#[tokio::test]
async fn login_refresh_and_logout_round_trip_through_postgres() {
    let app = spawn_store().await;
    let credential = app
        .auth
        .register("John@Example.com", "SecurePass123")
        .await
        .expect("Failed to register");
    assert_eq!(credential.email, "john@example.com");

    let pair = app.auth.login("john@example.com", "SecurePass123").await.unwrap();
    assert_eq!(pair.subject_id, credential.subject_id);

    let access_token = app.auth.refresh_access_token(&pair.refresh_token).await.unwrap();
    let header = format!("Bearer {}", access_token);
    assert_eq!(app.auth.authenticate(Some(&header)).unwrap(), credential.subject_id);

    app.auth.logout(&pair.refresh_token).await.unwrap();
    let err = app.auth.refresh_access_token(&pair.refresh_token).await.unwrap_err();
    assert_eq!(rejection(&err), Some(RefreshRejection::Revoked));
}

#[tokio::test]
async fn duplicate_email_is_a_unique_constraint_violation() {
    let app = spawn_store().await;
    app.subject("john@example.com").await;

    let err = app
        .store
        .create_credential("john@example.com", "$2b$12$another")
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::UniqueConstraintViolation(_)));
}

#[tokio::test]
async fn duplicate_registration_returns_409() {
    let app = spawn_store().await;
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    let server = run(listener, app.auth.clone()).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    let client = reqwest::Client::new();
    let body = json!({ "email": "john@example.com", "password": "SecurePass123" });

    let first = client
        .post(&format!("{}/api/users", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(&format!("{}/api/users", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(second.status().as_u16(), 409);
}
