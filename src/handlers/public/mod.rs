// handlers/public/mod.rs - Endpoints that need no token
//
// Route prefix: /api/register, /api/login, /health

pub mod auth;
pub mod health;

pub use health::health;
