//! SQLite persistence
//!
//! Reports are stored as JSON documents alongside a few indexed columns
//! (owner, season type, timestamps, soft-delete flag).

pub mod init;
pub mod models;
pub mod onboarding;
pub mod reports;

pub use init::*;
pub use models::*;
