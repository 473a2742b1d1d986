//! Outfit illustration endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::auth::CurrentUser;
use super::extract::ApiJson;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Shorter prompts are rejected before reaching the image model
pub const MIN_PROMPT_CHARS: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitImageRequest {
    #[serde(default)]
    pub image_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitImageResponse {
    pub image_url: String,
    pub image_prompt: String,
}

/// POST /api/generate-and-upload-image
pub async fn generate_and_upload_image(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(request): ApiJson<OutfitImageRequest>,
) -> ApiResult<Json<OutfitImageResponse>> {
    let prompt = request.image_prompt.unwrap_or_default();
    let prompt = prompt.trim();
    if prompt.chars().count() < MIN_PROMPT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "imagePrompt must be at least {} characters",
            MIN_PROMPT_CHARS
        )));
    }

    let image = state.image_generator.generate(prompt).await.map_err(|e| {
        error!(user_id = %user.user_id, error = %e, "Outfit image generation failed");
        ApiError::Upstream("Failed to generate outfit image".to_string())
    })?;

    let image_url = if image.persistent {
        image.url
    } else {
        state.uploader.upload(&image.url).await.map_err(|e| {
            error!(user_id = %user.user_id, error = %e, "Outfit image upload failed");
            ApiError::Upstream("Failed to upload outfit image".to_string())
        })?
    };

    info!(user_id = %user.user_id, image_url = %image_url, "Outfit image ready");
    Ok(Json(OutfitImageResponse {
        image_url,
        image_prompt: image.prompt,
    }))
}

pub fn outfit_routes() -> Router<AppState> {
    Router::new().route("/api/generate-and-upload-image", post(generate_and_upload_image))
}
