//! Citizen infrastructure reports: proximity-based deduplication and
//! corroboration, per-type bounties, and the resolution flow.

pub mod domain;
pub mod geo;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{BountyPolicy, GeoPoint, Report, ReportStatus, ReportType};
pub use geo::haversine_meters;
pub use repository::{ReportRecord, ReportRepository, ReportView};
pub use router::report_router;
pub use service::{ReportError, ReportService};
