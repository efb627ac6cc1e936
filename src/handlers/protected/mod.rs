// handlers/protected/mod.rs - Endpoints behind a bearer token
//
// Route prefix: /api/user/*, /api/userdata
// Middleware: jwt_auth_middleware (optional_auth_middleware for /api/userdata)

pub mod user;
