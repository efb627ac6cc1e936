use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use super::TokenResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/login - Exchange email and password for a session token
///
/// Unknown email and wrong password both answer 401 "Invalid credentials".
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(req) = payload?;

    let token = state.accounts.login(&req.email, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}
