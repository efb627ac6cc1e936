pub mod users;

pub use users::{set_admin, users_list};
