use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::TokenResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// POST /api/register - Create an account and sign it in
///
/// ```json
/// { "email": "a@x.com", "password": "pw123", "name": "Alice" }
/// ```
///
/// Responds 201 with `{ "token": "..." }`. Duplicate email is 409, missing
/// email or password is 400.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(req) = payload?;

    let token = state
        .accounts
        .register(&req.email, &req.password, &req.name)
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
