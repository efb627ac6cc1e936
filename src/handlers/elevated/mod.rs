// handlers/elevated/mod.rs - Endpoints that need the admin claim
//
// Route prefix: /api/users*
// Middleware: jwt_auth_middleware, then require_admin_middleware

pub mod admin;
