use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{AlertId, UserId, ZoneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    IncomingSupply,
    Outage,
    LowPressure,
    QualityWarning,
}

impl AlertType {
    pub const fn label(self) -> &'static str {
        match self {
            AlertType::IncomingSupply => "incoming_supply",
            AlertType::Outage => "outage",
            AlertType::LowPressure => "low_pressure",
            AlertType::QualityWarning => "quality_warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Expired,
    Cancelled,
    Verified,
}

impl AlertStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Expired => "expired",
            AlertStatus::Cancelled => "cancelled",
            AlertStatus::Verified => "verified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoutRole {
    Scout,
    UtilityOfficial,
    Admin,
}

/// Scout snapshot supplied by the caller when posting an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoutProfile {
    pub id: UserId,
    pub role: ScoutRole,
    pub is_verified: bool,
    pub reputation: u32,
}

/// A supply alert posted for one zone.
///
/// Confidence is fixed at creation from the scout's reputation. The feedback
/// score is a running mean over accurate/inaccurate votes; `is_verified`
/// latches true once the score and count cross the policy thresholds and
/// never reverts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub zone: ZoneId,
    pub scout: UserId,
    pub alert_type: AlertType,
    pub eta: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub confidence: f64,
    pub feedback_score: Option<f64>,
    pub feedback_count: u32,
    pub is_verified: bool,
    pub status: AlertStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Policy dials for alert feedback and reputation awards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPolicy {
    pub verify_score_threshold: f64,
    pub verify_feedback_count: u32,
    pub default_duration_minutes: i64,
    pub creation_reputation_award: u32,
    pub accuracy_reputation_bonus: u32,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self {
            verify_score_threshold: 0.7,
            verify_feedback_count: 3,
            default_duration_minutes: 120,
            creation_reputation_award: 10,
            accuracy_reputation_bonus: 2,
        }
    }
}

/// Caller identity for alert operations, resolved by the HTTP/auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertActor {
    Scout(UserId),
    Admin(UserId),
}
