use std::sync::Arc;

use thiserror::Error;

use crate::auth::{
    AuthError, HttpJwksSource, JwksSource, LocalVerifier, RemoteVerifier, TokenIssuer, TokenVerifier,
};
use crate::config::{AppConfig, AuthStrategy, ConfigError};
use crate::database::{CredentialStore, UserDataStore};
use crate::services::{AccountService, UserDataService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Shared request context: configuration, the active verifier and the services.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub accounts: AccountService,
    pub user_data: UserDataService,
}

impl AppState {
    /// Wires the verification strategy named in `config` to the given stores.
    pub fn new<S>(config: AppConfig, store: Arc<S>) -> Result<Self, StartupError>
    where
        S: CredentialStore + UserDataStore + 'static,
    {
        config.validate()?;

        let (verifier, issuer): (Arc<dyn TokenVerifier>, Option<TokenIssuer>) =
            match config.security.auth_strategy {
                AuthStrategy::Local => {
                    let secret = config
                        .security
                        .jwt_secret
                        .as_deref()
                        .ok_or(ConfigError::Missing("JWT_SECRET"))?;
                    let verifier: Arc<dyn TokenVerifier> = Arc::new(LocalVerifier::new(secret)?);
                    let issuer = TokenIssuer::new(secret, config.security.jwt_expiry_hours)?;
                    (verifier, Some(issuer))
                }
                AuthStrategy::Remote => {
                    let security = &config.security;
                    let uri = security
                        .jwks_uri
                        .as_deref()
                        .ok_or(ConfigError::Missing("AUTH_JWKS_URI"))?;
                    let audience = security
                        .audience
                        .as_deref()
                        .ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;
                    let issuer = security
                        .issuer
                        .as_deref()
                        .ok_or(ConfigError::Missing("AUTH_ISSUER"))?;
                    let source: Arc<dyn JwksSource> = Arc::new(HttpJwksSource::new(uri)?);
                    let verifier: Arc<dyn TokenVerifier> = Arc::new(RemoteVerifier::new(
                        source,
                        audience,
                        issuer,
                        security.jwks_requests_per_minute,
                    ));
                    (verifier, None)
                }
            };

        tracing::info!("Token verification strategy: {:?}", config.security.auth_strategy);
        Ok(Self::with_verifier(config, store, verifier, issuer))
    }

    /// Assembles state around an already-built verifier.
    pub fn with_verifier<S>(
        config: AppConfig,
        store: Arc<S>,
        verifier: Arc<dyn TokenVerifier>,
        issuer: Option<TokenIssuer>,
    ) -> Self
    where
        S: CredentialStore + UserDataStore + 'static,
    {
        let users: Arc<dyn CredentialStore> = store.clone();
        let user_data: Arc<dyn UserDataStore> = store;

        Self {
            config: Arc::new(config),
            verifier,
            accounts: AccountService::new(users.clone(), user_data.clone(), issuer),
            user_data: UserDataService::new(users, user_data),
        }
    }
}
