//! HTTP API handlers for colori-server

pub mod admin;
pub mod analysis;
pub mod auth;
pub mod buildinfo;
pub mod extract;
pub mod health;
pub mod onboarding;
pub mod outfit;
pub mod reports;

pub use admin::admin_routes;
pub use analysis::analysis_routes;
pub use auth::{AdminUser, CurrentUser, MaybeUser};
pub use extract::{ApiJson, ApiQuery};
pub use health::health_routes;
pub use onboarding::onboarding_routes;
pub use outfit::outfit_routes;
pub use reports::report_routes;
