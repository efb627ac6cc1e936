use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::cached_name;
use crate::database::models::SetlistKind;
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetlistQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetlistRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub setlist: Vec<String>,
    pub name: Option<String>,
}

/// GET /api/user/setlist?type=praise|worship - defaults to praise
pub async fn setlist_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SetlistQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let kind = SetlistKind::parse_or_default(query.kind.as_deref());
    let songs = state.user_data.setlist(&user.identity, kind).await?;
    Ok(Json(songs))
}

/// POST /api/user/setlist - Replace one setlist, chosen by `type` in the body
pub async fn setlist_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<SetlistRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let kind = SetlistKind::parse_or_default(req.kind.as_deref());

    state
        .user_data
        .save_setlist(&user.identity, kind, req.setlist, cached_name(req.name, &user))
        .await?;

    Ok(Json(MessageResponse::new(format!("{} setlist saved", kind))))
}
