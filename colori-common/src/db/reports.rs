//! Report storage
//!
//! Listings are always newest first. Deletion from the user's side is soft
//! (`is_deleted`), only admins purge rows.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::models::{NewReport, ReportPage, ReportSummary, StoredReport};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::{Error, Result};

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: String,
    user_id: String,
    user_name: Option<String>,
    result: String,
    raw_text: Option<String>,
    outfit_image: Option<String>,
    is_deleted: i64,
    deleted_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl ReportRow {
    fn into_report(self) -> Result<StoredReport> {
        Ok(StoredReport {
            id: parse_id(&self.id)?,
            user_id: self.user_id,
            user_name: self.user_name,
            result: serde_json::from_str(&self.result)?,
            raw_text: self.raw_text,
            outfit_image: self.outfit_image,
            is_deleted: self.is_deleted != 0,
            deleted_at: self.deleted_at.map(from_millis).transpose()?,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: String,
    user_id: String,
    user_name: Option<String>,
    season_type: String,
    outfit_image: Option<String>,
    is_deleted: i64,
    created_at: i64,
}

impl SummaryRow {
    fn into_summary(self) -> Result<ReportSummary> {
        Ok(ReportSummary {
            id: parse_id(&self.id)?,
            user_id: self.user_id,
            user_name: self.user_name,
            season_type: self.season_type,
            outfit_image: self.outfit_image,
            is_deleted: self.is_deleted != 0,
            created_at: from_millis(self.created_at)?,
        })
    }
}

const REPORT_COLUMNS: &str = "id, user_id, user_name, result, raw_text, outfit_image, \
                              is_deleted, deleted_at, created_at, updated_at";

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|e| Error::Internal(format!("Corrupt report id {}: {}", id, e)))
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::Internal(format!("Timestamp out of range: {}", ms)))
}

/// Store a new report and return it
pub async fn insert_report(pool: &SqlitePool, new: NewReport) -> Result<StoredReport> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let now_ms = now.timestamp_millis();
    let result_json = serde_json::to_string(&new.result)?;

    sqlx::query(
        r#"
        INSERT INTO reports (id, user_id, user_name, season_type, result, raw_text,
                             outfit_image, is_deleted, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&new.user_id)
    .bind(&new.user_name)
    .bind(&new.result.season_type)
    .bind(&result_json)
    .bind(&new.raw_text)
    .bind(&new.outfit_image)
    .bind(now_ms)
    .bind(now_ms)
    .execute(pool)
    .await?;

    debug!(report_id = %id, user_id = %new.user_id, "Inserted report");

    // Read back so timestamps carry the stored (millisecond) precision
    get_report(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Report {} missing after insert", id)))
}

/// Fetch a report by id, deleted or not
pub async fn get_report(pool: &SqlitePool, id: Uuid) -> Result<Option<StoredReport>> {
    let sql = format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS);
    let row: Option<ReportRow> = sqlx::query_as(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(ReportRow::into_report).transpose()
}

/// A user's reports, newest first
pub async fn list_reports_for_user(
    pool: &SqlitePool,
    user_id: &str,
    include_deleted: bool,
) -> Result<Vec<StoredReport>> {
    let sql = format!(
        "SELECT {} FROM reports WHERE user_id = ? {} ORDER BY created_at DESC, rowid DESC",
        REPORT_COLUMNS,
        if include_deleted { "" } else { "AND is_deleted = 0" }
    );

    let rows: Vec<ReportRow> = sqlx::query_as(&sql).bind(user_id).fetch_all(pool).await?;
    rows.into_iter().map(ReportRow::into_report).collect()
}

/// Every report across all users, one page at a time
pub async fn list_report_summaries(pool: &SqlitePool, requested_page: i64) -> Result<ReportPage> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(pool)
        .await?;

    let pagination = calculate_pagination(total, requested_page);

    let rows: Vec<SummaryRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, user_name, season_type, outfit_image, is_deleted, created_at
        FROM reports
        ORDER BY created_at DESC, rowid DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    Ok(ReportPage {
        reports: rows
            .into_iter()
            .map(SummaryRow::into_summary)
            .collect::<Result<Vec<_>>>()?,
        total,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
    })
}

/// Mark a report deleted; returns false when it does not exist or already is
pub async fn soft_delete_report(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let now_ms = Utc::now().timestamp_millis();
    let result = sqlx::query(
        "UPDATE reports SET is_deleted = 1, deleted_at = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
    )
    .bind(now_ms)
    .bind(now_ms)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark every report of a user deleted; returns how many changed
pub async fn soft_delete_reports_for_user(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let now_ms = Utc::now().timestamp_millis();
    let result = sqlx::query(
        "UPDATE reports SET is_deleted = 1, deleted_at = ?, updated_at = ? WHERE user_id = ? AND is_deleted = 0",
    )
    .bind(now_ms)
    .bind(now_ms)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Remove a report row permanently
pub async fn purge_report(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
