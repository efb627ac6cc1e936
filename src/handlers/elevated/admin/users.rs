use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::UserSummary;
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/users - Every account, without password hashes
pub async fn users_list(State(state): State<AppState>) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.accounts.list_users().await?;
    Ok(Json(users))
}

/// PUT /api/users/:id/admin - Grant or revoke the admin flag
///
/// ```json
/// { "isAdmin": true }
/// ```
///
/// Takes effect at the target's next login. An id that is not a UUID cannot
/// name an account, so it answers 404 like an unknown one.
pub async fn set_admin(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = payload?;
    let value = body
        .get("isAdmin")
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::bad_request("isAdmin must be a boolean"))?;

    let target = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("User not found"))?;

    state
        .accounts
        .set_admin(&admin.identity, target, value)
        .await?;

    let message = if value {
        "Admin rights granted"
    } else {
        "Admin rights revoked"
    };
    Ok(Json(MessageResponse::new(message)))
}
