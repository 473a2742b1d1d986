//! Selfie analysis endpoint

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use colori_common::analysis::{parse_report, AnalysisReport};
use colori_common::db;
use colori_common::onboarding::{prompt_age, prompt_style, OnboardingProfile};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::auth::MaybeUser;
use super::extract::ApiJson;
use crate::error::{ApiError, ApiResult};
use crate::services::SelfieImage;
use crate::AppState;

pub const ANALYSIS_FAILED: &str = "Gemini failed to analyze image. Please try again.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptResponse {
    /// Model output exactly as received
    pub result: String,
    pub analysis: AnalysisReport,
    pub image_prompt: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/generate-prompt
pub async fn generate_prompt(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiJson(request): ApiJson<GeneratePromptRequest>,
) -> ApiResult<Json<GeneratePromptResponse>> {
    let data_url = non_blank(request.image_base64)
        .ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;
    let selfie = SelfieImage::from_data_url(&data_url, state.settings.max_selfie_bytes)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let profile: Option<OnboardingProfile> = match &user {
        Some(user) => Some(db::onboarding::load_profile(&state.db, &user.user_id).await?),
        None => None,
    };
    let now = Utc::now();

    let age_choice = non_blank(request.age).or_else(|| {
        profile
            .as_ref()
            .and_then(|p| p.current_age(now))
            .map(|a| a.label().to_string())
    });
    let style_choice = non_blank(request.style).or_else(|| {
        profile
            .as_ref()
            .and_then(|p| p.current_style(now))
            .map(|s| s.label().to_string())
    });
    let age = prompt_age(age_choice.as_deref());
    let style = prompt_style(style_choice.as_deref());

    info!(
        user_id = user.as_ref().map(|u| u.user_id.as_str()).unwrap_or("anonymous"),
        mime_type = %selfie.mime_type,
        image_bytes = selfie.byte_len,
        age = %age,
        style = %style,
        "Received analysis request"
    );

    let text = state
        .analyzer
        .analyze(&selfie, &age, &style)
        .await
        .map_err(|e| {
            error!(error = %e, "Color analysis failed");
            ApiError::ServiceFailed(ANALYSIS_FAILED.to_string())
        })?;

    let analysis = parse_report(&text, &style);
    if !analysis.is_complete() {
        error!(text_len = text.len(), "Analysis output has no seasonal color type");
        tracing::debug!(output = %text, "Unparseable analysis output");
        return Err(ApiError::ServiceFailed(ANALYSIS_FAILED.to_string()));
    }
    if analysis.color_palette.is_empty() || analysis.makeup.is_empty() {
        info!(season = %analysis.season_type, "Analysis output is missing some sections");
    }

    let image_prompt = analysis.outfit.image_prompt.clone();
    Ok(Json(GeneratePromptResponse {
        result: text,
        analysis,
        image_prompt,
    }))
}

pub fn analysis_routes() -> Router<AppState> {
    Router::new().route("/api/generate-prompt", post(generate_prompt))
}
