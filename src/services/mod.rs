pub mod account_service;
pub mod user_data_service;

pub use account_service::{AccountError, AccountService};
pub use user_data_service::{UserData, UserDataService, UserDataUpdate};
