pub mod user;
pub mod user_data;

pub use user::{NewUser, User, UserSummary};
pub use user_data::{SetlistKind, SongList};
