//! Admin endpoints: report browsing and moderation, user management

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use colori_common::db::{self, ReportPage, StoredReport};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::auth::{AdminUser, MaybeUser};
use super::extract::ApiQuery;
use super::reports::{parse_report_id, SuccessResponse};
use crate::error::{ApiError, ApiResult};
use crate::services::{IdentityError, IdentityUser};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAdminResponse {
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub success: bool,
    pub reports_deleted: u64,
}

/// GET /api/check-admin
pub async fn check_admin(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Json<CheckAdminResponse> {
    let is_admin = match user {
        Some(user) => state.is_admin(&user.user_id).await,
        None => false,
    };
    Json(CheckAdminResponse { is_admin })
}

/// GET /api/admin/reports?page=N
pub async fn list_all_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<ReportPage>> {
    let page = db::reports::list_report_summaries(&state.db, query.page).await?;
    Ok(Json(page))
}

/// GET /api/admin/reports/:user_id
pub async fn list_user_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<StoredReport>>> {
    let reports = db::reports::list_reports_for_user(&state.db, &user_id, true).await?;
    Ok(Json(reports))
}

/// DELETE /api/admin/report/:id
pub async fn purge_report(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_report_id(&id)?;
    if !db::reports::purge_report(&state.db, id).await? {
        return Err(ApiError::NotFound("Report not found".to_string()));
    }
    info!(admin_id = %admin.user_id, report_id = %id, "Report permanently removed");
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/admin/user/:id
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<IdentityUser>> {
    let user = state.identity.get_user(&id).await.map_err(|e| {
        warn!(target_user = %id, error = %e, "Could not fetch user");
        ApiError::NotFound("Failed to fetch target user data".to_string())
    })?;
    Ok(Json(user))
}

/// DELETE /api/admin/user/:id
///
/// Removes the account at the identity provider and soft-deletes the
/// user's reports.
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteUserResponse>> {
    if admin.user_id == id {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    match state.identity.delete_user(&id).await {
        Ok(()) => {}
        Err(IdentityError::UserNotFound(_)) => {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            error!(target_user = %id, error = %e, "Identity provider refused user deletion");
            return Err(ApiError::Upstream("Failed to delete user".to_string()));
        }
    }

    let reports_deleted = db::reports::soft_delete_reports_for_user(&state.db, &id).await?;
    info!(
        admin_id = %admin.user_id,
        target_user = %id,
        reports_deleted,
        "User deleted by admin"
    );

    Ok(Json(DeleteUserResponse {
        success: true,
        reports_deleted,
    }))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/check-admin", get(check_admin))
        .route("/api/admin/reports", get(list_all_reports))
        .route("/api/admin/reports/:user_id", get(list_user_reports))
        .route("/api/admin/report/:id", delete(purge_report))
        .route("/api/admin/user/:id", get(get_user).delete(delete_user))
}
