use serde::{Deserialize, Serialize};

use super::domain::{Alert, AlertStatus};
use crate::identity::{AlertId, ZoneId};
use crate::store::StoreError;

/// Repository record carrying an alert and its optimistic version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert: Alert,
    pub version: u64,
}

impl AlertRecord {
    pub fn new(alert: Alert) -> Self {
        Self { alert, version: 0 }
    }

    pub fn view(&self) -> AlertView {
        AlertView {
            alert_id: self.alert.id.clone(),
            zone: self.alert.zone.clone(),
            alert_type: self.alert.alert_type.label(),
            status: self.alert.status.label(),
            confidence: self.alert.confidence,
            feedback_score: self.alert.feedback_score,
            feedback_count: self.alert.feedback_count,
            is_verified: self.alert.is_verified,
            expires_at: self.alert.expires_at,
        }
    }
}

/// Sanitized representation of an alert's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    pub alert_id: AlertId,
    pub zone: ZoneId,
    pub alert_type: &'static str,
    pub status: &'static str,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_score: Option<f64>,
    pub feedback_count: u32,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Storage abstraction for alerts.
///
/// `update` must reject records whose `version` no longer matches the stored
/// row (`StoreError::VersionConflict`).
pub trait AlertRepository: Send + Sync {
    fn insert(&self, record: AlertRecord) -> Result<AlertRecord, StoreError>;
    fn fetch(&self, id: &AlertId) -> Result<Option<AlertRecord>, StoreError>;
    fn update(&self, record: AlertRecord) -> Result<AlertRecord, StoreError>;
    fn in_zone(&self, zone: &ZoneId, statuses: &[AlertStatus]) -> Result<Vec<AlertRecord>, StoreError>;
}
