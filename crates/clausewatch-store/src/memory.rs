//! Process-local report store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::StoreError;
use crate::report::{HISTORY_LIMIT, NewReport, ReportStore, StoredReport, next_id, validate_user};

#[derive(Default)]
pub struct MemoryStore {
    reports: RwLock<HashMap<String, Vec<StoredReport>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save_report(&self, user_id: &str, report: &NewReport) -> Result<String, StoreError> {
        let user_id = validate_user(user_id)?;
        let created_at = Utc::now();
        let id = next_id(created_at);

        let stored = StoredReport {
            id: id.clone(),
            user_id: user_id.to_string(),
            title: report.title.clone(),
            created_at,
            response: report.response.clone(),
        };
        self.reports
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(stored);

        info!(user_id, id = %id, "saved report");
        Ok(id)
    }

    async fn list_reports(&self, user_id: &str) -> Result<Vec<StoredReport>, StoreError> {
        let user_id = validate_user(user_id)?;
        let guard = self.reports.read().await;
        let mut reports = guard.get(user_id).cloned().unwrap_or_default();
        reports.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
        reports.truncate(HISTORY_LIMIT);
        Ok(reports)
    }

    async fn get_report(&self, user_id: &str, id: &str) -> Result<StoredReport, StoreError> {
        let user_id = validate_user(user_id)?;
        self.reports
            .read()
            .await
            .get(user_id)
            .and_then(|reports| reports.iter().find(|r| r.id == id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
