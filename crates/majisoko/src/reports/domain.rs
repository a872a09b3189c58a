use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{ReportId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    BurstPipe,
    Leakage,
    IllegalConnection,
    Contamination,
    Vandalism,
    Other,
}

impl ReportType {
    pub const fn label(self) -> &'static str {
        match self {
            ReportType::BurstPipe => "burst_pipe",
            ReportType::Leakage => "leakage",
            ReportType::IllegalConnection => "illegal_connection",
            ReportType::Contamination => "contamination",
            ReportType::Vandalism => "vandalism",
            ReportType::Other => "other",
        }
    }
}

/// Report workflow status. Advances monotonically by `rank`; `Rejected` is
/// terminal from any pre-resolved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Verified,
    Forwarded,
    InProgress,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Verified => "verified",
            ReportStatus::Forwarded => "forwarded",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            ReportStatus::Pending => 0,
            ReportStatus::Verified => 1,
            ReportStatus::Forwarded => 2,
            ReportStatus::InProgress => 3,
            ReportStatus::Resolved => 4,
            ReportStatus::Rejected => 5,
        }
    }

    /// Statuses that still corroborate a new nearby report.
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            ReportStatus::Pending
                | ReportStatus::Verified
                | ReportStatus::Forwarded
                | ReportStatus::InProgress
        )
    }
}

/// WGS84 coordinate, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// A citizen infrastructure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter: UserId,
    pub report_type: ReportType,
    pub location: GeoPoint,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub bounty_amount: i64,
    pub bounty_paid: bool,
    pub bounty_paid_at: Option<DateTime<Utc>>,
    pub verified_count: u32,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<UserId>,
    pub resolution: Option<String>,
}

/// Policy dials for report deduplication and bounties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BountyPolicy {
    pub recent_window_hours: i64,
    pub proximity_meters: f64,
    pub corroboration_threshold: u32,
    pub report_reputation_award: u32,
    pub resolve_reputation_bonus: u32,
}

impl Default for BountyPolicy {
    fn default() -> Self {
        Self {
            recent_window_hours: 24,
            proximity_meters: 100.0,
            corroboration_threshold: 2,
            report_reputation_award: 5,
            resolve_reputation_bonus: 20,
        }
    }
}

impl BountyPolicy {
    /// Fixed bounty per report type, in minor currency units.
    pub const fn bounty_for(&self, report_type: ReportType) -> i64 {
        match report_type {
            ReportType::BurstPipe => 10_000,
            ReportType::Leakage => 5_000,
            ReportType::IllegalConnection => 15_000,
            ReportType::Contamination => 20_000,
            ReportType::Vandalism => 7_500,
            ReportType::Other => 2_500,
        }
    }
}
