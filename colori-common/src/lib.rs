//! # ColoriAI Common Library
//!
//! Shared code for the ColoriAI service:
//! - Analysis report types and the report-text parser
//! - Onboarding (age/style) rules
//! - Configuration loading
//! - SQLite persistence for reports and onboarding profiles
//! - Pagination helpers

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod onboarding;
pub mod pagination;

pub use analysis::{parse_report, AnalysisReport};
pub use error::{Error, Result};
