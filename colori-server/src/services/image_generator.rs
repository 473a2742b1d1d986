//! Outfit illustration generation

use async_trait::async_trait;
use colori_common::config::{ImageConfig, ImageProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Prompt reported back when generation is switched off
pub const PLACEHOLDER_PROMPT_NOTE: &str = "Image generation is disabled. Using static placeholder.";

#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No image returned")]
    NoImage,

    #[error("Image generator is not configured: {0}")]
    NotConfigured(String),
}

/// A generated (or stand-in) outfit image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Where the image can be fetched; short-lived for OpenAI results
    pub url: String,
    /// Prompt to show alongside the image
    pub prompt: String,
    /// Already hosted somewhere permanent; no re-upload needed
    pub persistent: bool,
}

#[async_trait]
pub trait OutfitImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError>;
}

/// Always returns the same hosted flatlay
pub struct PlaceholderImageGenerator {
    url: String,
}

impl PlaceholderImageGenerator {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl OutfitImageGenerator for PlaceholderImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        tracing::info!(prompt_len = prompt.len(), "Image generation disabled, returning placeholder");
        Ok(GeneratedImage {
            url: self.url.clone(),
            prompt: PLACEHOLDER_PROMPT_NOTE.to_string(),
            persistent: true,
        })
    }
}

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

/// OpenAI images API client
pub struct OpenAiImageGenerator {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
    quality: String,
}

impl OpenAiImageGenerator {
    pub fn new(config: &ImageConfig, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ImageGenError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageGenError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
        })
    }
}

#[async_trait]
impl OutfitImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let request = ImagesRequest {
            model: &self.model,
            prompt,
            size: &self.size,
            quality: &self.quality,
            n: 1,
        };

        tracing::info!(model = %self.model, size = %self.size, "Requesting outfit image");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageGenError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ImageGenError::ApiError(status.as_u16(), error_text));
        }

        let body: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::ParseError(e.to_string()))?;

        let image = body.data.into_iter().next().ok_or(ImageGenError::NoImage)?;
        let image_url = image.url.ok_or(ImageGenError::NoImage)?;

        Ok(GeneratedImage {
            url: image_url,
            prompt: image.revised_prompt.unwrap_or_else(|| prompt.to_string()),
            persistent: false,
        })
    }
}

/// Pick the generator named by the image configuration
pub fn from_config(config: &ImageConfig, timeout: Duration) -> Result<Arc<dyn OutfitImageGenerator>, ImageGenError> {
    match config.provider {
        ImageProvider::Placeholder => Ok(Arc::new(PlaceholderImageGenerator::new(
            config.placeholder_url.clone(),
        ))),
        ImageProvider::OpenAi => {
            let key = config
                .openai_api_key
                .clone()
                .filter(|k| colori_common::config::is_valid_key(k))
                .ok_or_else(|| ImageGenError::NotConfigured("image.openai_api_key is missing".to_string()))?;
            Ok(Arc::new(OpenAiImageGenerator::new(config, key, timeout)?))
        }
    }
}
