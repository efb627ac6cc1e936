use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::middleware::AuthUser;
use crate::services::{UserData, UserDataUpdate};
use crate::state::AppState;

/// GET /api/userdata - Favorites, both setlists and profile in one read
///
/// Anonymous callers (non-production only) get all-empty defaults.
pub async fn userdata_get(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
) -> Result<Json<UserData>, ApiError> {
    let identity = user.as_ref().map(|Extension(u)| &u.identity);
    let data = state.user_data.aggregate(identity).await?;
    Ok(Json(data))
}

/// PUT /api/userdata - Fan a partial payload out to the underlying documents
pub async fn userdata_put(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    payload: Result<Json<UserDataUpdate>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Some(Extension(user)) = user else {
        return Err(ApiError::unauthorized("No token provided"));
    };
    let Json(update) = payload?;

    state.user_data.save_aggregate(&user.identity, update).await?;
    Ok(Json(MessageResponse::new("User data saved")))
}
