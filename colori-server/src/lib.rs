//! colori-server library
//!
//! HTTP front end for seasonal color analysis: selfie intake, analysis via
//! the vision model, outfit images, report storage and PDF export.

pub mod api;
pub mod error;
pub mod report_pdf;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::{ColorAnalyzer, IdentityProvider, ImageUploader, OutfitImageGenerator};

/// Request-independent settings the handlers need
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// `public_metadata.role` that marks an admin
    pub admin_role: String,
    /// Largest accepted decoded selfie
    pub max_selfie_bytes: usize,
    /// Origins allowed to call the API from a browser; empty disables CORS
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            admin_role: "admin".to_string(),
            max_selfie_bytes: 10 * 1024 * 1024,
            allowed_origins: Vec::new(),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub analyzer: Arc<dyn ColorAnalyzer>,
    pub image_generator: Arc<dyn OutfitImageGenerator>,
    pub uploader: Arc<dyn ImageUploader>,
    pub identity: Arc<dyn IdentityProvider>,
    pub settings: Arc<ServerSettings>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        analyzer: Arc<dyn ColorAnalyzer>,
        image_generator: Arc<dyn OutfitImageGenerator>,
        uploader: Arc<dyn ImageUploader>,
        identity: Arc<dyn IdentityProvider>,
        settings: ServerSettings,
    ) -> Self {
        Self {
            db,
            analyzer,
            image_generator,
            uploader,
            identity,
            settings: Arc::new(settings),
            startup_time: Utc::now(),
        }
    }

    /// Whether `user_id` holds the admin role; lookup failures count as no
    pub async fn is_admin(&self, user_id: &str) -> bool {
        match self.identity.get_user(user_id).await {
            Ok(user) => user.is_admin(&self.settings.admin_role),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Admin check failed");
                false
            }
        }
    }
}

/// Body limit for JSON requests carrying a base64 selfie
fn body_limit(max_selfie_bytes: usize) -> usize {
    max_selfie_bytes / 3 * 4 + 64 * 1024
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let limit = body_limit(state.settings.max_selfie_bytes);
    let cors = cors_layer(&state.settings.allowed_origins);

    let router = Router::new()
        .merge(api::health_routes())
        .merge(api::onboarding_routes())
        .merge(api::analysis_routes())
        .merge(api::outfit_routes())
        .merge(api::report_routes())
        .merge(api::admin_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}
