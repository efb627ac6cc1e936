//! Session tokens: issuing, verifying and the identity they carry.
//!
//! A deployment runs exactly one [`TokenVerifier`]: [`LocalVerifier`] for
//! tokens minted by [`TokenIssuer`] with the shared secret, or
//! [`RemoteVerifier`] for RS256 tokens from an external issuer. Tokens are
//! never revoked; a token stays valid (admin flag included) until `exp`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::User;

pub mod identity;
pub mod local;
pub mod password;
pub mod remote;

pub use identity::Identity;
pub use local::LocalVerifier;
pub use remote::{HttpJwksSource, JwksSource, RemoteVerifier};

/// Payload of a self-issued session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            admin: user.is_admin,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// What a verifier hands back once a token checks out, whichever strategy produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    pub identity: Identity,
    pub email: String,
    pub name: String,
    pub admin: bool,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<Claims> for VerifiedClaims {
    fn from(claims: Claims) -> Self {
        Self {
            identity: Identity::Local(claims.id),
            email: claims.email,
            name: claims.name,
            admin: claims.admin,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Signing keys unavailable: {0}")]
    KeyUnavailable(String),

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Fails with `InvalidToken` (or `KeyUnavailable`) - never falls back to default claims.
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError>;
}

/// Mints HS256 session tokens with a fixed lifetime
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours as i64),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims::for_user(user, issued_at, self.ttl);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn user(email: &str, admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: String::new(),
            name: "Alice".to_string(),
            is_admin: admin,
            created_at: Utc::now(),
        }
    }
}
