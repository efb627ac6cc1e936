use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::Deserialize;

use super::cached_name;
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FavoritesRequest {
    #[serde(default)]
    pub favorites: Vec<String>,
    pub name: Option<String>,
}

/// GET /api/user/favorites - Ordered song ids, empty when never saved
pub async fn favorites_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<String>>, ApiError> {
    let songs = state.user_data.favorites(&user.identity).await?;
    Ok(Json(songs))
}

/// POST /api/user/favorites - Replace the whole list
///
/// A body without `favorites` clears the list.
pub async fn favorites_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<FavoritesRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;

    state
        .user_data
        .save_favorites(&user.identity, req.favorites, cached_name(req.name, &user))
        .await?;

    Ok(Json(MessageResponse::new("Favorites saved")))
}
