//! Persisting generated outfit images on a CDN
//!
//! OpenAI result URLs expire after about an hour, so generated images are
//! re-hosted before they are saved into a report.

use async_trait::async_trait;
use colori_common::config::CdnConfig;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Uploader is not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Copy the image at `source_url` and return its permanent URL
    async fn upload(&self, source_url: &str) -> Result<String, UploadError>;
}

/// Used when no CDN is configured; the source URL is kept as-is
pub struct PassthroughUploader;

#[async_trait]
impl ImageUploader for PassthroughUploader {
    async fn upload(&self, source_url: &str) -> Result<String, UploadError> {
        Ok(source_url.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

/// Cloudinary signed upload client
pub struct CloudinaryUploader {
    http_client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl CloudinaryUploader {
    pub fn new(config: &CdnConfig, timeout: Duration) -> Result<Self, UploadError> {
        let api_secret = config
            .api_secret
            .clone()
            .filter(|s| colori_common::config::is_valid_key(s))
            .ok_or_else(|| UploadError::NotConfigured("cdn.api_secret is missing".to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret,
            folder: config.folder.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.base_url, self.cloud_name)
    }
}

/// Signature over the alphabetically sorted signed parameters
pub fn sign_upload(folder: &str, timestamp: i64, api_secret: &str) -> String {
    let to_sign = format!("folder={}&timestamp={}{}", folder, timestamp, api_secret);
    let digest = Sha256::digest(to_sign.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, source_url: &str) -> Result<String, UploadError> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign_upload(&self.folder, timestamp, &self.api_secret);
        let timestamp = timestamp.to_string();

        let form = [
            ("file", source_url),
            ("api_key", self.api_key.as_str()),
            ("folder", self.folder.as_str()),
            ("timestamp", timestamp.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        tracing::info!(cloud = %self.cloud_name, folder = %self.folder, "Uploading outfit image");

        let response = self
            .http_client
            .post(self.endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UploadError::ApiError(status.as_u16(), error_text));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::ParseError(e.to_string()))?;

        body.secure_url
            .or(body.url)
            .ok_or_else(|| UploadError::ParseError("response has no secure_url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_upstream::spawn_upstream;
    use axum::{extract::Form, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn cdn_config(base_url: String) -> CdnConfig {
        CdnConfig {
            cloud_name: "demo".to_string(),
            api_key: "123456".to_string(),
            api_secret: Some("shh".to_string()),
            folder: "colori/outfits".to_string(),
            base_url,
        }
    }

    #[test]
    fn test_signature_is_sha256_hex() {
        let sig = sign_upload("colori/outfits", 1_700_000_000, "shh");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, sign_upload("colori/outfits", 1_700_000_000, "shh"));
        assert_ne!(sig, sign_upload("colori/outfits", 1_700_000_001, "shh"));
    }

    #[tokio::test]
    async fn test_passthrough_keeps_url() {
        let url = PassthroughUploader.upload("https://img.example/a.png").await.unwrap();
        assert_eq!(url, "https://img.example/a.png");
    }

    #[tokio::test]
    async fn test_cloudinary_signed_upload() {
        let app = Router::new().route(
            "/v1_1/demo/image/upload",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                assert_eq!(form["file"], "https://img.example/a.png");
                assert_eq!(form["api_key"], "123456");
                assert_eq!(form["folder"], "colori/outfits");
                assert_eq!(form["signature_algorithm"], "sha256");
                let timestamp: i64 = form["timestamp"].parse().unwrap();
                assert_eq!(form["signature"], sign_upload("colori/outfits", timestamp, "shh"));
                Json(json!({"secure_url": "https://res.example/demo/a.png"}))
            }),
        );
        let base = spawn_upstream(app).await;

        let uploader = CloudinaryUploader::new(&cdn_config(base), Duration::from_secs(5)).unwrap();
        let url = uploader.upload("https://img.example/a.png").await.unwrap();
        assert_eq!(url, "https://res.example/demo/a.png");
    }

    #[tokio::test]
    async fn test_cloudinary_error_status() {
        let app = Router::new().route(
            "/v1_1/demo/image/upload",
            post(|| async { (StatusCode::UNAUTHORIZED, "Invalid Signature") }),
        );
        let base = spawn_upstream(app).await;

        let uploader = CloudinaryUploader::new(&cdn_config(base), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            uploader.upload("https://img.example/a.png").await,
            Err(UploadError::ApiError(401, _))
        ));
    }

    #[test]
    fn test_requires_secret() {
        let mut config = cdn_config("http://localhost".to_string());
        config.api_secret = None;
        assert!(matches!(
            CloudinaryUploader::new(&config, Duration::from_secs(1)),
            Err(UploadError::NotConfigured(_))
        ));
    }
}
