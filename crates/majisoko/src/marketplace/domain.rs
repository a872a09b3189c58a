use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{OrderId, ProductId, UserId, VendorId};

/// Lifecycle status tracked on every order. All amounts that accompany it
/// are integer minor-currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    PaymentPending,
    Paid,
    Preparing,
    OutForDelivery,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::PaymentPending => "payment_pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

/// Mobile-money providers accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Mpesa,
    AirtelMoney,
    TigoPesa,
    HaloPesa,
}

impl PaymentProvider {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentProvider::Mpesa => "mpesa",
            PaymentProvider::AirtelMoney => "airtel_money",
            PaymentProvider::TigoPesa => "tigo_pesa",
            PaymentProvider::HaloPesa => "halo_pesa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

/// Escrow position of the funds backing a payment. `Held` is only legal on a
/// completed payment; `Released`/`Refunded` only follow `Held`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    None,
    Held,
    Released,
    Refunded,
}

impl EscrowStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EscrowStatus::None => "none",
            EscrowStatus::Held => "held",
            EscrowStatus::Released => "released",
            EscrowStatus::Refunded => "refunded",
        }
    }
}

/// Catalog entry snapshot supplied by the caller at pricing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub unit_price: i64,
    pub is_available: bool,
}

/// Vendor snapshot supplied by the caller at pricing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSnapshot {
    pub id: VendorId,
    pub owner: UserId,
    pub is_active: bool,
    pub is_verified: bool,
    pub delivery_fee: i64,
    pub min_order: i64,
    pub products: Vec<ProductSnapshot>,
}

/// Priced order line. Unit price is snapshotted at creation and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// A customer order against a single vendor.
///
/// Invariants: `total = subtotal + delivery_fee + platform_fee` and
/// `subtotal = Σ(line.unit_price × line.quantity)`. Timestamps are each set
/// exactly once as the status progresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: UserId,
    pub vendor: VendorId,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub platform_fee: i64,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

/// Payment record, one-to-one with its order. The amount always equals the
/// order total; settlement itself happens at the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: OrderId,
    pub provider: PaymentProvider,
    pub amount: i64,
    pub status: PaymentStatus,
    pub escrow: EscrowStatus,
    pub escrow_released_at: Option<DateTime<Utc>>,
    pub initiated_at: DateTime<Utc>,
}

/// Customer rating left on a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRating {
    pub score: u8,
    pub comment: Option<String>,
    pub rated_at: DateTime<Utc>,
}

/// Caller identity for order operations, resolved by the HTTP/auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderActor {
    Customer(UserId),
    Vendor(VendorId),
    Admin(UserId),
}
