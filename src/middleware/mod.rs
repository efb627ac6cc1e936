pub mod auth;

pub use auth::{
    extract_bearer_token, jwt_auth_middleware, optional_auth_middleware,
    require_admin_middleware, AuthUser,
};
