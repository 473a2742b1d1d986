//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AnalysisReport;

/// A saved seasonal color report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: Option<String>,
    pub result: AnalysisReport,
    /// Analysis text the report was parsed from, when the client sent it
    #[serde(skip_serializing)]
    pub raw_text: Option<String>,
    pub outfit_image: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report fields supplied at creation time
#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: String,
    pub user_name: Option<String>,
    pub result: AnalysisReport,
    pub raw_text: Option<String>,
    pub outfit_image: Option<String>,
}

/// One row of the admin report listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: Option<String>,
    pub season_type: String,
    pub outfit_image: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// A page of report summaries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    pub reports: Vec<ReportSummary>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}
