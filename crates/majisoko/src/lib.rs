//! Majisoko core library.
//!
//! Business workflows for the water-supply platform: the vendor marketplace
//! with its order/escrow lifecycle, zone-scoped supply alerts posted by
//! scouts, and the citizen infrastructure-report bounty flow. Persistence,
//! notification delivery, and mobile-money settlement are collaborators
//! reached through traits; everything here is request-scoped validate-then-
//! apply logic consumed by the API service.

pub mod alerts;
pub mod config;
pub mod error;
pub mod identity;
pub mod marketplace;
pub mod notify;
pub mod reports;
pub mod scoring;
pub mod store;
pub mod telemetry;
