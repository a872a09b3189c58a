//! Zone-scoped supply alerts: scout-confidence scoring, feedback
//! aggregation, and the verification threshold.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Alert, AlertActor, AlertStatus, AlertType, FeedbackPolicy, ScoutProfile, ScoutRole};
pub use repository::{AlertRecord, AlertRepository, AlertView};
pub use router::alert_router;
pub use service::{AlertError, AlertService};
