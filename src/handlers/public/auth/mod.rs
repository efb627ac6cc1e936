// handlers/public/auth/mod.rs - Token acquisition
//
// Both endpoints answer 403 when the deployment only accepts externally
// issued tokens.

pub mod login;
pub mod register;

pub use login::login;
pub use register::register;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
