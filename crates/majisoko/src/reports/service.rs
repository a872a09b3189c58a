use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::warn;

use super::domain::{BountyPolicy, GeoPoint, Report, ReportStatus, ReportType};
use super::geo::haversine_meters;
use super::repository::{ReportRecord, ReportRepository};
use crate::identity::{ReportId, UserId};
use crate::notify::{Notification, NotificationPublisher, NotificationTemplate};
use crate::store::{ReputationLedger, StoreError};

/// Error raised by the report service.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("a report of this type from the same reporter already exists nearby")]
    DuplicateReport,
    #[error("report is already resolved")]
    AlreadyResolved,
    #[error("invalid report status change from {} to {}", .from.label(), .to.label())]
    InvalidStatusChange { from: ReportStatus, to: ReportStatus },
    #[error(transparent)]
    Store(#[from] StoreError),
}

static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_report_id() -> ReportId {
    let id = REPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReportId(format!("rep-{id:06}"))
}

/// Service filing, corroborating, and resolving infrastructure reports.
pub struct ReportService<R, N, L> {
    repository: Arc<R>,
    notifications: Arc<N>,
    ledger: Arc<L>,
    policy: BountyPolicy,
}

impl<R, N, L> ReportService<R, N, L>
where
    R: ReportRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, ledger: Arc<L>, policy: BountyPolicy) -> Self {
        Self {
            repository,
            notifications,
            ledger,
            policy,
        }
    }

    /// File a new report, deduplicating against recent open reports of the
    /// same type near the given location.
    ///
    /// A nearby open report from the same reporter rejects the filing. Once
    /// the corroborating count reaches the policy threshold the new report is
    /// verified immediately and nearby reports still pending are upgraded
    /// with it.
    pub fn file(
        &self,
        reporter: UserId,
        report_type: ReportType,
        location: GeoPoint,
        description: Option<String>,
    ) -> Result<ReportRecord, ReportError> {
        let now = Utc::now();
        let since = now - Duration::hours(self.policy.recent_window_hours);
        let recent = self.repository.recent_of_type(report_type, since)?;

        let nearby: Vec<ReportRecord> = recent
            .into_iter()
            .filter(|record| record.report.status.is_open())
            .filter(|record| {
                haversine_meters(&record.report.location, &location) <= self.policy.proximity_meters
            })
            .collect();
        if nearby
            .iter()
            .any(|record| record.report.reporter == reporter)
        {
            return Err(ReportError::DuplicateReport);
        }

        let nearby_count = nearby.len() as u32;
        let corroborated = nearby_count >= self.policy.corroboration_threshold;
        let report = Report {
            id: next_report_id(),
            reporter: reporter.clone(),
            report_type,
            location,
            description,
            status: if corroborated {
                ReportStatus::Verified
            } else {
                ReportStatus::Pending
            },
            bounty_amount: self.policy.bounty_for(report_type),
            bounty_paid: false,
            bounty_paid_at: None,
            verified_count: nearby_count + 1,
            created_at: now,
            resolved_at: None,
            resolved_by: None,
            resolution: None,
        };

        let stored = self.repository.insert(ReportRecord::new(report))?;
        if corroborated {
            for mut record in nearby {
                if record.report.status == ReportStatus::Pending {
                    record.report.status = ReportStatus::Verified;
                    record.report.verified_count = nearby_count + 1;
                    let upgraded = self.repository.update(record)?;
                    self.notify(
                        upgraded.report.reporter.clone(),
                        NotificationTemplate::ReportCorroborated,
                        &upgraded,
                    );
                }
            }
            self.notify(
                reporter.clone(),
                NotificationTemplate::ReportCorroborated,
                &stored,
            );
        }
        self.ledger
            .award(&reporter, self.policy.report_reputation_award)?;
        Ok(stored)
    }

    /// Resolve a report. The bounty is paid exactly once, on the resolution
    /// that first finds it unpaid; the fund transfer itself is the payment
    /// collaborator's job.
    pub fn resolve(
        &self,
        report_id: &ReportId,
        admin: UserId,
        resolution: String,
    ) -> Result<ReportRecord, ReportError> {
        let mut record = self.fetch(report_id)?;
        if record.report.status == ReportStatus::Resolved {
            return Err(ReportError::AlreadyResolved);
        }

        let now = Utc::now();
        record.report.status = ReportStatus::Resolved;
        record.report.resolved_at = Some(now);
        record.report.resolved_by = Some(admin);
        record.report.resolution = Some(resolution);
        let paying_bounty = !record.report.bounty_paid;
        if paying_bounty {
            record.report.bounty_paid = true;
            record.report.bounty_paid_at = Some(now);
        }
        let reporter = record.report.reporter.clone();

        let stored = self.repository.update(record)?;
        if paying_bounty {
            self.ledger
                .award(&reporter, self.policy.resolve_reputation_bonus)?;
            self.notify(reporter, NotificationTemplate::BountyPaid, &stored);
        }
        Ok(stored)
    }

    /// Move a report forward through the workflow.
    ///
    /// Status only advances by rank. `Rejected` is reachable from any
    /// pre-resolved status; `Resolved` is only reachable through `resolve`.
    pub fn advance(
        &self,
        report_id: &ReportId,
        requested: ReportStatus,
    ) -> Result<ReportRecord, ReportError> {
        let mut record = self.fetch(report_id)?;
        let current = record.report.status;

        let allowed = match requested {
            ReportStatus::Resolved => false,
            ReportStatus::Rejected => current.rank() < ReportStatus::Resolved.rank(),
            _ => current.is_open() && requested.rank() > current.rank(),
        };
        if !allowed {
            return Err(ReportError::InvalidStatusChange {
                from: current,
                to: requested,
            });
        }

        record.report.status = requested;
        Ok(self.repository.update(record)?)
    }

    pub fn get(&self, report_id: &ReportId) -> Result<ReportRecord, ReportError> {
        self.fetch(report_id)
    }

    fn fetch(&self, report_id: &ReportId) -> Result<ReportRecord, ReportError> {
        Ok(self
            .repository
            .fetch(report_id)?
            .ok_or(StoreError::NotFound)?)
    }

    fn notify(&self, recipient: UserId, template: NotificationTemplate, record: &ReportRecord) {
        let mut details = BTreeMap::new();
        details.insert("report_id".to_string(), record.report.id.0.clone());
        details.insert(
            "report_type".to_string(),
            record.report.report_type.label().to_string(),
        );
        details.insert(
            "status".to_string(),
            record.report.status.label().to_string(),
        );

        if let Err(err) = self.notifications.publish(Notification {
            recipient,
            template,
            details,
        }) {
            warn!(error = %err, report_id = %record.report.id.0, "report notification failed");
        }
    }
}
