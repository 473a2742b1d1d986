//! Report storage, retrieval and export for the signed-in user

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use colori_common::analysis::{parse_report, AnalysisReport};
use colori_common::db::{self, NewReport, StoredReport};
use colori_common::onboarding::prompt_style;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::CurrentUser;
use super::extract::ApiJson;
use crate::error::{ApiError, ApiResult};
use crate::report_pdf;
use crate::AppState;

pub const PDF_FILENAME: &str = "ColoriAI_Report.pdf";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReportRequest {
    /// Structured analysis as returned by generate-prompt
    #[serde(default)]
    pub result: Option<AnalysisReport>,
    /// Raw model text; parsed when `result` is absent
    #[serde(default)]
    pub raw_result: Option<String>,
    #[serde(default)]
    pub outfit_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Report ids are UUIDs; anything else cannot exist
pub(crate) fn parse_report_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound("Report not found".to_string()))
}

/// Load a report the caller may read: their own live report, or any report for admins
async fn load_readable_report(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<StoredReport> {
    let id = parse_report_id(id)?;
    let report = db::reports::get_report(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))?;

    if report.user_id == user.user_id && !report.is_deleted {
        return Ok(report);
    }
    if state.is_admin(&user.user_id).await {
        return Ok(report);
    }
    Err(ApiError::NotFound("Report not found".to_string()))
}

/// POST /api/save-report
pub async fn save_report(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(request): ApiJson<SaveReportRequest>,
) -> ApiResult<Json<StoredReport>> {
    let raw_text = request.raw_result.filter(|t| !t.trim().is_empty());

    let result = match (request.result, raw_text.as_deref()) {
        (Some(result), _) => result,
        (None, Some(text)) => {
            let profile = db::onboarding::load_profile(&state.db, &user.user_id).await?;
            let style = profile.current_style(Utc::now()).map(|s| s.label());
            parse_report(text, &prompt_style(style))
        }
        (None, None) => {
            return Err(ApiError::BadRequest("Report content is required".to_string()));
        }
    };

    let user_name = match state.identity.get_user(&user.user_id).await {
        Ok(profile) => profile.display_name(),
        Err(e) => {
            warn!(user_id = %user.user_id, error = %e, "Saving report without a user name");
            None
        }
    };

    let report = db::reports::insert_report(
        &state.db,
        NewReport {
            user_id: user.user_id.clone(),
            user_name,
            result,
            raw_text,
            outfit_image: request.outfit_image.filter(|u| !u.trim().is_empty()),
        },
    )
    .await?;

    info!(user_id = %user.user_id, report_id = %report.id, season = %report.result.season_type, "Saved report");
    Ok(Json(report))
}

/// GET /api/reports
///
/// Admins also see their own soft-deleted reports.
pub async fn list_reports(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<StoredReport>>> {
    let is_admin = state.is_admin(&user.user_id).await;
    let reports = db::reports::list_reports_for_user(&state.db, &user.user_id, is_admin).await?;
    tracing::debug!(user_id = %user.user_id, is_admin, count = reports.len(), "Listed reports");
    Ok(Json(reports))
}

/// GET /api/report/:id
pub async fn get_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StoredReport>> {
    let report = load_readable_report(&state, &user, &id).await?;
    Ok(Json(report))
}

/// GET /api/report/:id/pdf
pub async fn get_report_pdf(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = load_readable_report(&state, &user, &id).await?;
    let report_id = report.id;

    let bytes = tokio::task::spawn_blocking(move || report_pdf::render_report(&report))
        .await
        .map_err(|e| ApiError::Internal(format!("PDF task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("PDF rendering failed: {}", e)))?;

    info!(report_id = %report_id, size = bytes.len(), "Rendered report PDF");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", PDF_FILENAME),
            ),
        ],
        bytes,
    ))
}

/// DELETE /api/delete-report/:id
///
/// Owners and admins soft-delete; the row stays for admin review.
pub async fn delete_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let not_allowed = || ApiError::Forbidden("Not allowed".to_string());

    let id = Uuid::parse_str(&id).map_err(|_| not_allowed())?;
    let report = db::reports::get_report(&state.db, id)
        .await?
        .ok_or_else(not_allowed)?;

    let is_owner = report.user_id == user.user_id && !report.is_deleted;
    if !is_owner && !state.is_admin(&user.user_id).await {
        return Err(not_allowed());
    }

    let changed = db::reports::soft_delete_report(&state.db, id).await?;
    info!(user_id = %user.user_id, report_id = %id, changed, "Report deleted");
    Ok(Json(SuccessResponse { success: true }))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/save-report", post(save_report))
        .route("/api/reports", get(list_reports))
        .route("/api/report/:id", get(get_report))
        .route("/api/report/:id/pdf", get(get_report_pdf))
        .route("/api/delete-report/:id", delete(delete_report))
}
