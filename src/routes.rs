use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, optional_auth_middleware, require_admin_middleware};
use crate::state::AppState;

/// The full HTTP surface with its middleware stack
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        .merge(user_routes(state.clone()))
        .merge(userdata_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
}

fn user_routes(state: AppState) -> Router<AppState> {
    use protected::user;

    Router::new()
        .route(
            "/api/user/favorites",
            get(user::favorites_get).post(user::favorites_post),
        )
        .route(
            "/api/user/setlist",
            get(user::setlist_get).post(user::setlist_post),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn userdata_routes(state: AppState) -> Router<AppState> {
    use protected::user;

    // PUT still demands a caller; the handler rejects anonymous writes
    Router::new()
        .route(
            "/api/userdata",
            get(user::userdata_get).put(user::userdata_put),
        )
        .route_layer(from_fn_with_state(state, optional_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use elevated::admin;

    // Layers run outermost-last: jwt first, then the admin check
    Router::new()
        .route("/api/users", get(admin::users_list))
        .route("/api/users/:id/admin", put(admin::set_admin))
        .route_layer(from_fn(require_admin_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
