//! Hosted identity provider (Clerk backend API)
//!
//! Sessions are verified server-side against the provider rather than by
//! checking JWT signatures locally; the token payload is only read to find
//! the session id.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Token is malformed, expired or revoked
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

/// User profile as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub public_metadata: Value,
}

impl IdentityUser {
    /// Name to print on reports: full name, then username, then email
    pub fn display_name(&self) -> Option<String> {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return Some(full);
        }
        self.username
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.email_addresses.first().map(|e| e.email_address.clone()))
    }

    pub fn is_admin(&self, admin_role: &str) -> bool {
        self.public_metadata.get("role").and_then(Value::as_str) == Some(admin_role)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a session token to the signed-in user's id
    async fn verify_session(&self, token: &str) -> Result<String, IdentityError>;

    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sid: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifySessionRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct Session {
    user_id: String,
    #[serde(default)]
    status: Option<String>,
}

/// Read the `sid` claim without verifying the signature
pub fn session_id_from_token(token: &str) -> Result<String, IdentityError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| IdentityError::InvalidSession("token is not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| IdentityError::InvalidSession("token payload is not base64url".to_string()))?;
    let claims: SessionClaims = serde_json::from_slice(&bytes)
        .map_err(|_| IdentityError::InvalidSession("token payload is not JSON".to_string()))?;
    claims
        .sid
        .filter(|sid| !sid.is_empty())
        .ok_or_else(|| IdentityError::InvalidSession("token has no session id".to_string()))
}

/// Clerk backend API client
pub struct ClerkClient {
    http_client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl ClerkClient {
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    fn user_url(&self, user_id: &str) -> String {
        format!("{}/v1/users/{}", self.base_url, user_id)
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn verify_session(&self, token: &str) -> Result<String, IdentityError> {
        let sid = session_id_from_token(token)?;
        let url = format!("{}/v1/sessions/{}/verify", self.base_url, sid);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&VerifySessionRequest { token })
            .send()
            .await
            .map_err(|e| IdentityError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), "Session rejected by identity provider");
            return Err(IdentityError::InvalidSession(format!("status {}", status.as_u16())));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(IdentityError::ApiError(status.as_u16(), error_text));
        }

        let session: Session = response
            .json()
            .await
            .map_err(|e| IdentityError::ParseError(e.to_string()))?;

        match session.status.as_deref() {
            None | Some("active") => Ok(session.user_id),
            Some(other) => Err(IdentityError::InvalidSession(format!("session is {}", other))),
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .http_client
            .get(self.user_url(user_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| IdentityError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(user_id.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(IdentityError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::ParseError(e.to_string()))
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        let response = self
            .http_client
            .delete(self.user_url(user_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| IdentityError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(user_id.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(IdentityError::ApiError(status.as_u16(), error_text));
        }

        tracing::info!(user_id = %user_id, "User deleted at identity provider");
        Ok(())
    }
}
