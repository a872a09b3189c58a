use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::domain::{Alert, AlertActor, AlertStatus, AlertType, FeedbackPolicy, ScoutProfile, ScoutRole};
use super::repository::{AlertRecord, AlertRepository};
use crate::identity::{AlertId, UserId, ZoneId};
use crate::notify::{Notification, NotificationPublisher, NotificationTemplate};
use crate::scoring::scout_confidence;
use crate::store::{ReputationLedger, StoreError};

/// Error raised by the alert service.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("unverified scouts cannot post alerts")]
    ScoutNotVerified,
    #[error("alert is {}, not active", .status.label())]
    AlertClosed { status: AlertStatus },
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

static ALERT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_alert_id() -> AlertId {
    let id = ALERT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AlertId(format!("alr-{id:06}"))
}

/// Service for posting alerts and aggregating community feedback on them.
pub struct AlertService<R, N, L> {
    repository: Arc<R>,
    notifications: Arc<N>,
    ledger: Arc<L>,
    policy: FeedbackPolicy,
}

impl<R, N, L> AlertService<R, N, L>
where
    R: AlertRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, ledger: Arc<L>, policy: FeedbackPolicy) -> Self {
        Self {
            repository,
            notifications,
            ledger,
            policy,
        }
    }

    /// Post an alert for a zone.
    ///
    /// Confidence comes from the scout's reputation. Expiry: an eta extends
    /// by the stated duration (or the policy default); a bare duration counts
    /// from now; neither leaves the alert open-ended.
    pub fn post(
        &self,
        zone: ZoneId,
        scout: &ScoutProfile,
        alert_type: AlertType,
        eta: Option<DateTime<Utc>>,
        duration_minutes: Option<i64>,
    ) -> Result<AlertRecord, AlertError> {
        if scout.role == ScoutRole::Scout && !scout.is_verified {
            return Err(AlertError::ScoutNotVerified);
        }

        let expires_at = match (eta, duration_minutes) {
            (Some(eta), duration) => {
                Some(eta + Duration::minutes(duration.unwrap_or(self.policy.default_duration_minutes)))
            }
            (None, Some(duration)) => Some(Utc::now() + Duration::minutes(duration)),
            (None, None) => None,
        };

        let alert = Alert {
            id: next_alert_id(),
            zone,
            scout: scout.id.clone(),
            alert_type,
            eta,
            duration_minutes,
            confidence: scout_confidence(scout.reputation),
            feedback_score: None,
            feedback_count: 0,
            is_verified: false,
            status: AlertStatus::Active,
            expires_at,
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(AlertRecord::new(alert))?;
        self.ledger
            .award(&scout.id, self.policy.creation_reputation_award)?;
        self.notify(
            scout.id.clone(),
            NotificationTemplate::SupplyAlertPosted,
            &stored,
        );
        Ok(stored)
    }

    /// Fold one accurate/inaccurate vote into the alert's running mean.
    ///
    /// Verification latches: once the score and count have crossed the
    /// thresholds the flag stays set no matter what later feedback says.
    pub fn submit_feedback(
        &self,
        alert_id: &AlertId,
        accurate: bool,
    ) -> Result<AlertRecord, AlertError> {
        let mut record = self.fetch(alert_id)?;
        if !matches!(record.alert.status, AlertStatus::Active | AlertStatus::Verified) {
            return Err(AlertError::AlertClosed {
                status: record.alert.status,
            });
        }

        let old_score = record.alert.feedback_score.unwrap_or(0.0);
        let old_count = record.alert.feedback_count;
        let vote = if accurate { 1.0 } else { 0.0 };
        let count = old_count + 1;
        let score = (old_score * f64::from(old_count) + vote) / f64::from(count);
        record.alert.feedback_score = Some(score);
        record.alert.feedback_count = count;

        let newly_verified = !record.alert.is_verified
            && score >= self.policy.verify_score_threshold
            && count >= self.policy.verify_feedback_count;
        if newly_verified {
            record.alert.is_verified = true;
            record.alert.status = AlertStatus::Verified;
        }
        let scout = record.alert.scout.clone();

        let stored = self.repository.update(record)?;
        if accurate {
            self.ledger
                .award(&scout, self.policy.accuracy_reputation_bonus)?;
        }
        if newly_verified {
            self.notify(scout, NotificationTemplate::AlertVerified, &stored);
        }
        Ok(stored)
    }

    /// Cancel an active alert on behalf of its scout or an admin.
    pub fn cancel(&self, alert_id: &AlertId, actor: &AlertActor) -> Result<AlertRecord, AlertError> {
        let mut record = self.fetch(alert_id)?;
        let authorized = match actor {
            AlertActor::Scout(scout) => *scout == record.alert.scout,
            AlertActor::Admin(_) => true,
        };
        if !authorized {
            return Err(AlertError::Forbidden(
                "only the posting scout or an administrator can cancel an alert",
            ));
        }
        if record.alert.status != AlertStatus::Active {
            return Err(AlertError::AlertClosed {
                status: record.alert.status,
            });
        }

        record.alert.status = AlertStatus::Cancelled;
        Ok(self.repository.update(record)?)
    }

    /// Alerts currently visible for a zone.
    pub fn zone_feed(&self, zone: &ZoneId) -> Result<Vec<AlertRecord>, AlertError> {
        Ok(self
            .repository
            .in_zone(zone, &[AlertStatus::Active, AlertStatus::Verified])?)
    }

    pub fn get(&self, alert_id: &AlertId) -> Result<AlertRecord, AlertError> {
        self.fetch(alert_id)
    }

    fn fetch(&self, alert_id: &AlertId) -> Result<AlertRecord, AlertError> {
        Ok(self
            .repository
            .fetch(alert_id)?
            .ok_or(StoreError::NotFound)?)
    }

    fn notify(&self, recipient: UserId, template: NotificationTemplate, record: &AlertRecord) {
        let mut details = BTreeMap::new();
        details.insert("alert_id".to_string(), record.alert.id.0.clone());
        details.insert("zone".to_string(), record.alert.zone.0.clone());
        details.insert(
            "alert_type".to_string(),
            record.alert.alert_type.label().to_string(),
        );

        if let Err(err) = self.notifications.publish(Notification {
            recipient,
            template,
            details,
        }) {
            warn!(error = %err, alert_id = %record.alert.id.0, "alert notification failed");
        }
    }
}
