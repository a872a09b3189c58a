use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Trait describing the outbound notification hook (SMS/push adapters).
///
/// Services invoke it after a committed transition; a failed publish is
/// logged by the caller and never rolls the transition back.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Payload handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub template: NotificationTemplate,
    pub details: BTreeMap<String, String>,
}

/// Template catalog understood by the delivery layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    OrderPlaced,
    OrderStatusChanged,
    PaymentReceived,
    EscrowReleased,
    OrderRefunded,
    SupplyAlertPosted,
    AlertVerified,
    ReportCorroborated,
    BountyPaid,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
