// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) → Protected (bearer token) → Elevated (admin claim)
pub mod elevated;
pub mod protected;
pub mod public;

use serde::Serialize;

/// `{message}` body returned by writes that have nothing else to report
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
