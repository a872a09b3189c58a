use crate::identity::UserId;

/// Error enumeration shared by the per-domain repository traits.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    VersionConflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Reputation bookkeeping for scouts, reporters, and raters.
pub trait ReputationLedger: Send + Sync {
    fn award(&self, user: &UserId, points: u32) -> Result<(), StoreError>;
}
