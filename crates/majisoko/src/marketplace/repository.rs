use serde::{Deserialize, Serialize};

use super::domain::{Order, OrderRating, PaymentRecord};
use crate::identity::{OrderId, VendorId};
use crate::store::StoreError;

/// Repository record pairing an order with its payment and rating.
///
/// Holding the payment on the same record lets the escrow-release and
/// cancel-refund pairings land in one atomic `update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order: Order,
    pub payment: Option<PaymentRecord>,
    pub rating: Option<OrderRating>,
    pub version: u64,
}

impl OrderRecord {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            payment: None,
            rating: None,
            version: 0,
        }
    }

    pub fn status_view(&self) -> OrderStatusView {
        OrderStatusView {
            order_id: self.order.id.clone(),
            status: self.order.status.label(),
            total: self.order.total,
            escrow: self.payment.as_ref().map(|payment| payment.escrow.label()),
            rated: self.rating.is_some(),
        }
    }
}

/// Sanitized representation of an order's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub status: &'static str,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escrow: Option<&'static str>,
    pub rated: bool,
}

/// Vendor rating aggregate: the running mean and count are all that is
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VendorRating {
    pub average: f64,
    pub count: u32,
}

impl VendorRating {
    pub fn apply(self, score: u8) -> Self {
        let count = self.count + 1;
        let average = (self.average * f64::from(self.count) + f64::from(score)) / f64::from(count);
        Self { average, count }
    }
}

impl Default for VendorRating {
    fn default() -> Self {
        Self {
            average: 0.0,
            count: 0,
        }
    }
}

/// Storage abstraction so the order service can be exercised in isolation.
///
/// `update` must reject records whose `version` no longer matches the stored
/// row (`StoreError::VersionConflict`) so concurrent transitions on the same
/// order serialize.
pub trait OrderRepository: Send + Sync {
    fn insert(&self, record: OrderRecord) -> Result<OrderRecord, StoreError>;
    fn fetch(&self, id: &OrderId) -> Result<Option<OrderRecord>, StoreError>;
    fn update(&self, record: OrderRecord) -> Result<OrderRecord, StoreError>;
    fn vendor_rating(&self, vendor: &VendorId) -> Result<VendorRating, StoreError>;
    fn store_vendor_rating(&self, vendor: &VendorId, rating: VendorRating)
        -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_aggregate_keeps_a_running_mean() {
        let rating = VendorRating::default().apply(5).apply(4).apply(3);
        assert_eq!(rating.count, 3);
        assert!((rating.average - 4.0).abs() < f64::EPSILON);
    }
}
