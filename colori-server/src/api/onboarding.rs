//! Onboarding choices (age range, then style)
//!
//! Choices are kept per user for a day; after that the flow starts again.

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use colori_common::db;
use colori_common::onboarding::{next_step, AgeRange, OnboardingProfile, OnboardingStep, StyleOption};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::CurrentUser;
use super::extract::ApiJson;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub age: Option<AgeRange>,
    pub style: Option<StyleOption>,
    pub next_step: OnboardingStep,
}

impl OnboardingResponse {
    fn from_profile(profile: &OnboardingProfile, is_admin: bool) -> Self {
        let now = Utc::now();
        Self {
            age: profile.current_age(now),
            style: profile.current_style(now),
            next_step: next_step(profile, now, is_admin),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AgeRequest {
    pub age: String,
}

#[derive(Debug, Deserialize)]
pub struct StyleRequest {
    pub style: String,
}

/// GET /api/onboarding
pub async fn get_onboarding(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<OnboardingResponse>> {
    let profile = db::onboarding::load_profile(&state.db, &user.user_id).await?;
    let is_admin = state.is_admin(&user.user_id).await;
    Ok(Json(OnboardingResponse::from_profile(&profile, is_admin)))
}

/// PUT /api/onboarding/age
pub async fn set_age(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(request): ApiJson<AgeRequest>,
) -> ApiResult<Json<OnboardingResponse>> {
    let age: AgeRange = request.age.parse()?;
    let profile = db::onboarding::set_profile_age(&state.db, &user.user_id, age, Utc::now()).await?;
    info!(user_id = %user.user_id, age = %age, "Onboarding age selected");
    Ok(Json(OnboardingResponse::from_profile(&profile, false)))
}

/// PUT /api/onboarding/style
pub async fn set_style(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(request): ApiJson<StyleRequest>,
) -> ApiResult<Json<OnboardingResponse>> {
    let style: StyleOption = request.style.parse()?;

    let existing = db::onboarding::load_profile(&state.db, &user.user_id).await?;
    if existing.current_age(Utc::now()).is_none() {
        return Err(ApiError::BadRequest("Select an age range first".to_string()));
    }

    let profile = db::onboarding::set_profile_style(&state.db, &user.user_id, style, Utc::now()).await?;
    info!(user_id = %user.user_id, style = %style, "Onboarding style selected");
    Ok(Json(OnboardingResponse::from_profile(&profile, false)))
}

pub fn onboarding_routes() -> Router<AppState> {
    Router::new()
        .route("/api/onboarding", get(get_onboarding))
        .route("/api/onboarding/age", put(set_age))
        .route("/api/onboarding/style", put(set_style))
}
