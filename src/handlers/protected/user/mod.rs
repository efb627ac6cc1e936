pub mod favorites;
pub mod setlist;
pub mod userdata;

pub use favorites::{favorites_get, favorites_post};
pub use setlist::{setlist_get, setlist_post};
pub use userdata::{userdata_get, userdata_put};

use crate::middleware::AuthUser;

/// Display name cached next to a saved list: the body's, else the token's
fn cached_name(body: Option<String>, user: &AuthUser) -> Option<String> {
    body.or_else(|| Some(user.name.clone()).filter(|n| !n.is_empty()))
}
