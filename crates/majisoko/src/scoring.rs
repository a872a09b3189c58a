//! Pure scoring helpers shared by the alert and marketplace workflows.

use serde::{Deserialize, Serialize};

/// Reputation at or beyond this value earns the maximum confidence bonus.
pub const REPUTATION_CAP: u32 = 1000;

const CONFIDENCE_FLOOR: f64 = 0.5;
const CONFIDENCE_SPAN: f64 = 0.45;

/// Confidence assigned to a scout's alert at creation time.
///
/// Base 0.5 with a linear bonus up to 0.45 as reputation approaches
/// [`REPUTATION_CAP`], rounded to two decimals.
pub fn scout_confidence(reputation: u32) -> f64 {
    let progress = f64::from(reputation.min(REPUTATION_CAP)) / f64::from(REPUTATION_CAP);
    let raw = CONFIDENCE_FLOOR + CONFIDENCE_SPAN * progress;
    (raw * 100.0).round() / 100.0
}

/// Platform fee dials, amounts in minor currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub rate: f64,
    pub minimum: i64,
    pub maximum: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            rate: 0.05,
            minimum: 500,
            maximum: 50_000,
        }
    }
}

/// Platform fee for an order subtotal: `clamp(round(subtotal * rate), min, max)`.
pub fn platform_fee(subtotal: i64, schedule: &FeeSchedule) -> i64 {
    let raw = (subtotal as f64 * schedule.rate).round() as i64;
    raw.clamp(schedule.minimum, schedule.maximum)
}
