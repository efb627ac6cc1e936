#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use songbook_api::config::{AppConfig, Environment};
use songbook_api::database::{CredentialStore, MemoryStore};
use songbook_api::{app, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";

/// In-process server over the memory store
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_environment(Environment::Development)
    }

    pub fn production() -> Self {
        Self::with_environment(Environment::Production)
    }

    fn with_environment(environment: Environment) -> Self {
        let mut config = AppConfig::development();
        config.environment = environment;
        config.security.jwt_secret = Some(JWT_SECRET.to_string());

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config.clone(), store.clone())
            .expect("local test configuration is valid");

        Self::from_state(state, store, config)
    }

    pub fn from_state(state: AppState, store: Arc<MemoryStore>, config: AppConfig) -> Self {
        Self {
            router: app(state),
            store,
            config,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value)?)
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok((status, json))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    /// Registers an account and returns its token
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/register",
                None,
                json!({ "email": email, "password": password, "name": name }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        token_of(&body)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/login", None, json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        token_of(&body)
    }

    /// Registers an account, flips its flag in storage and logs in again so
    /// the returned token carries the admin claim
    pub async fn register_admin(&self, email: &str) -> Result<String> {
        self.register(email, "admin-pw", "Admin").await?;
        let user = self
            .store
            .find_by_email(email)
            .await?
            .context("admin just registered")?;
        self.store.set_admin(user.id, true).await?;
        self.login(email, "admin-pw").await
    }

    pub async fn user_id(&self, email: &str) -> Result<uuid::Uuid> {
        let user = self.store.find_by_email(email).await?.context("no such user")?;
        Ok(user.id)
    }
}

pub fn token_of(body: &Value) -> Result<String> {
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("response carries no token")
}
