use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; never defaulted
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

/// Which token verification strategy the deployment runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    /// Self-issued HS256 tokens signed with `jwt_secret`
    Local,
    /// RS256 tokens from an external issuer, verified against its JWKS
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub auth_strategy: AuthStrategy,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: u64,
    pub jwks_uri: Option<String>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub jwks_requests_per_minute: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(v) = env::var("SONGBOOK_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("AUTH_STRATEGY") {
            match v.to_ascii_lowercase().as_str() {
                "local" => self.security.auth_strategy = AuthStrategy::Local,
                "remote" | "jwks" => self.security.auth_strategy = AuthStrategy::Remote,
                other => tracing::warn!("Ignoring unknown AUTH_STRATEGY '{}'", other),
            }
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = Some(v);
            }
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("AUTH_JWKS_URI") {
            self.security.jwks_uri = Some(v);
        }
        if let Ok(v) = env::var("AUTH_AUDIENCE") {
            self.security.audience = Some(v);
        }
        if let Ok(v) = env::var("AUTH_ISSUER") {
            self.security.issuer = Some(v);
        }
        if let Ok(v) = env::var("AUTH_JWKS_REQUESTS_PER_MINUTE") {
            self.security.jwks_requests_per_minute =
                v.parse().unwrap_or(self.security.jwks_requests_per_minute);
        }

        self
    }

    /// Checks that the active auth strategy has everything it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.security.auth_strategy {
            AuthStrategy::Local => {
                if self.security.jwt_secret.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::Missing("JWT_SECRET"));
                }
            }
            AuthStrategy::Remote => {
                let uri = self
                    .security
                    .jwks_uri
                    .as_deref()
                    .ok_or(ConfigError::Missing("AUTH_JWKS_URI"))?;
                url::Url::parse(uri).map_err(|_| ConfigError::Invalid {
                    name: "AUTH_JWKS_URI",
                    value: uri.to_string(),
                })?;
                if self.security.audience.is_none() {
                    return Err(ConfigError::Missing("AUTH_AUDIENCE"));
                }
                if self.security.issuer.is_none() {
                    return Err(ConfigError::Missing("AUTH_ISSUER"));
                }
                if self.security.jwks_requests_per_minute == 0 {
                    return Err(ConfigError::Invalid {
                        name: "AUTH_JWKS_REQUESTS_PER_MINUTE",
                        value: "0".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3001,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5500".to_string(),
                    "http://127.0.0.1:5500".to_string(),
                ],
                auth_strategy: AuthStrategy::Local,
                jwt_secret: None,
                jwt_expiry_hours: 24 * 7, // 1 week
                jwks_uri: None,
                audience: None,
                issuer: None,
                jwks_requests_per_minute: 5,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.max_request_size_bytes = 5 * 1024 * 1024;
        config.security.cors_origins = Vec::new();
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.max_request_size_bytes = 2 * 1024 * 1024;
        config.security.cors_origins = Vec::new();
        config
    }
}

// Global singleton config for the binaries - the library itself takes AppConfig by value
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
