use serde::Deserialize;

use crate::auth::SigningKey;
use crate::error::ConfigError;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub platform: Platform,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Deployment flag. Only `dev` permits destructive admin operations.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[default]
    Production,
}

impl Platform {
    pub fn is_dev(self) -> bool {
        matches!(self, Platform::Dev)
    }
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT authentication settings
#[derive(Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds
}

impl JwtSettings {
    /// Build the process-wide signing key. Fails on an empty secret.
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        SigningKey::new(self.secret.as_bytes())
    }

    pub fn access_token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry must be positive, got {}",
                self.access_token_expiry
            )));
        }
        chrono::Duration::try_seconds(self.access_token_expiry).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry out of range, got {}",
                self.access_token_expiry
            ))
        })
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_access_token_expiry() -> i64 {
    3600
}

/// Load settings from an optional `configuration` file, overridden by
/// `APP_`-prefixed environment variables (`APP_JWT__SECRET=...`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;

    if settings.jwt.secret.is_empty() {
        return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
    }

    Ok(settings)
}
