use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Identity, VerifiedClaims};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller context extracted from a verified token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub identity: Identity,
    pub email: String,
    pub name: String,
    pub admin: bool,
}

impl From<VerifiedClaims> for AuthUser {
    fn from(claims: VerifiedClaims) -> Self {
        Self {
            identity: claims.identity,
            email: claims.email,
            name: claims.name,
            admin: claims.admin,
        }
    }
}

/// Rejects the request with 401 unless it carries a valid bearer token
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = state.verifier.verify(token).await?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Must run after `jwt_auth_middleware`; only the token's admin claim is consulted
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.admin {
        tracing::info!("Non-admin {} denied access to {}", user.identity, request.uri().path());
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}

/// Attaches the caller when a valid token is present.
///
/// Outside production a missing or rejected token lets the request through
/// anonymously; in production it is a 401 like any protected route.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let strict = state.config.is_production();

    let verified = match extract_bearer_token(&headers) {
        Ok(token) => state.verifier.verify(token).await.map_err(ApiError::from),
        Err(e) => Err(e),
    };

    match verified {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser::from(claims));
        }
        Err(e) if strict => return Err(e),
        Err(e) => tracing::debug!("Proceeding anonymously: {}", e),
    }

    Ok(next.run(request).await)
}

/// Pulls the token out of `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("No token provided"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(ApiError::unauthorized("No token provided")),
        None => Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        )),
    }
}
