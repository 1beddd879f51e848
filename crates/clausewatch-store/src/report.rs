use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clausewatch_core::AnalysisResponse;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Maximum number of reports returned by a history listing.
pub const HISTORY_LIMIT: usize = 50;

/// A report to be saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub response: AnalysisResponse,
}

impl NewReport {
    pub fn new(response: AnalysisResponse) -> Self {
        Self {
            title: None,
            response,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A saved report as read back from a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub response: AnalysisResponse,
}

/// Per-user report persistence.
///
/// Listings are newest first and capped at [`HISTORY_LIMIT`]. A report is
/// only visible to the user that saved it.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Save a report and return its id.
    async fn save_report(&self, user_id: &str, report: &NewReport) -> Result<String, StoreError>;

    async fn list_reports(&self, user_id: &str) -> Result<Vec<StoredReport>, StoreError>;

    async fn get_report(&self, user_id: &str, id: &str) -> Result<StoredReport, StoreError>;
}

/// Trimmed user id, or `InvalidUser` when blank.
pub(crate) fn validate_user(user_id: &str) -> Result<&str, StoreError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        Err(StoreError::InvalidUser)
    } else {
        Ok(user_id)
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Time-ordered report id. Lexicographic order matches creation order within
/// one process.
pub(crate) fn next_id(now: DateTime<Utc>) -> String {
    let nanos = now.timestamp_nanos_opt().unwrap_or_default();
    format_id(nanos, ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Both halves are fixed-width, so the counter never wraps into a shorter id.
fn format_id(nanos: i64, seq: u64) -> String {
    format!("{nanos:016x}{seq:016x}")
}
