pub mod admin;
pub mod backfill;
pub mod migrate;
pub mod users;
