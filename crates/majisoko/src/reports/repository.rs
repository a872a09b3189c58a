use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Report, ReportType};
use crate::identity::ReportId;
use crate::store::StoreError;

/// Repository record carrying a report and its optimistic version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub report: Report,
    pub version: u64,
}

impl ReportRecord {
    pub fn new(report: Report) -> Self {
        Self { report, version: 0 }
    }

    pub fn view(&self) -> ReportView {
        ReportView {
            report_id: self.report.id.clone(),
            report_type: self.report.report_type.label(),
            status: self.report.status.label(),
            bounty_amount: self.report.bounty_amount,
            bounty_paid: self.report.bounty_paid,
            verified_count: self.report.verified_count,
        }
    }
}

/// Sanitized representation of a report's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub report_id: ReportId,
    pub report_type: &'static str,
    pub status: &'static str,
    pub bounty_amount: i64,
    pub bounty_paid: bool,
    pub verified_count: u32,
}

/// Storage abstraction for reports.
///
/// `recent_of_type` returns every report of the given type created at or
/// after `since`, regardless of status; the service filters further. `update`
/// must reject stale versions with `StoreError::VersionConflict`.
pub trait ReportRepository: Send + Sync {
    fn insert(&self, record: ReportRecord) -> Result<ReportRecord, StoreError>;
    fn fetch(&self, id: &ReportId) -> Result<Option<ReportRecord>, StoreError>;
    fn update(&self, record: ReportRecord) -> Result<ReportRecord, StoreError>;
    fn recent_of_type(
        &self,
        report_type: ReportType,
        since: DateTime<Utc>,
    ) -> Result<Vec<ReportRecord>, StoreError>;
}
