//! Session extractors
//!
//! The session token arrives either as `Authorization: Bearer <token>` or in
//! the `__session` cookie set by the identity provider's browser SDK.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::error::ApiError;
use crate::services::{IdentityError, IdentityUser};
use crate::AppState;

pub const SESSION_COOKIE: &str = "__session";

/// Pull the session token from the request headers
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<String>, ApiError> {
    let Some(token) = session_token(&parts.headers) else {
        return Ok(None);
    };

    match state.identity.verify_session(&token).await {
        Ok(user_id) => Ok(Some(user_id)),
        Err(IdentityError::InvalidSession(reason)) => {
            debug!(reason = %reason, "Rejected session token");
            Err(ApiError::Unauthorized)
        }
        Err(e) => {
            tracing::error!(error = %e, "Session verification failed");
            Err(ApiError::Upstream("Could not verify session".to_string()))
        }
    }
}

/// Signed-in caller; 401 otherwise
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(|user_id| CurrentUser { user_id })
            .ok_or(ApiError::Unauthorized)
    }
}

/// Caller who may be anonymous; an invalid token is still rejected
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        Ok(MaybeUser(user.map(|user_id| CurrentUser { user_id })))
    }
}

/// Signed-in caller holding the admin role; 403 otherwise
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: String,
    pub profile: IdentityUser,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser { user_id } = CurrentUser::from_request_parts(parts, state).await?;

        let profile = state.identity.get_user(&user_id).await.map_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Could not load caller profile");
            ApiError::Forbidden("Failed to fetch user data".to_string())
        })?;

        if !profile.is_admin(&state.settings.admin_role) {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser { user_id, profile })
    }
}
