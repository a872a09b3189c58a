use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    EscrowStatus, Order, OrderActor, OrderRating, OrderStatus, PaymentProvider, PaymentRecord,
    PaymentStatus, VendorSnapshot,
};
use super::lifecycle;
use super::pricing::{self, LineItemRequest, PricingError};
use super::repository::{OrderRecord, OrderRepository, VendorRating};
use crate::identity::{OrderId, UserId};
use crate::notify::{Notification, NotificationPublisher, NotificationTemplate};
use crate::scoring::FeeSchedule;
use crate::store::{ReputationLedger, StoreError};

/// Policy dials for the order workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPolicy {
    pub fees: FeeSchedule,
    pub rating_reputation_award: u32,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            rating_reputation_award: 5,
        }
    }
}

/// Result reported back by the payment collaborator's webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Completed,
    Failed,
}

/// Error raised by the order service.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("invalid order transition from {} to {}", .from.label(), .to.label())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("order has already been rated")]
    AlreadyRated,
    #[error("only completed orders can be rated")]
    NotCompleted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_order_id() -> OrderId {
    let id = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OrderId(format!("ord-{id:06}"))
}

/// Service composing pricing, the status state machine, and the escrow
/// bookkeeping. Every operation validates fully before its single write.
pub struct OrderService<R, N, L> {
    repository: Arc<R>,
    notifications: Arc<N>,
    ledger: Arc<L>,
    policy: OrderPolicy,
}

impl<R, N, L> OrderService<R, N, L>
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, ledger: Arc<L>, policy: OrderPolicy) -> Self {
        Self {
            repository,
            notifications,
            ledger,
            policy,
        }
    }

    /// Price the requested lines and persist a pending order.
    pub fn place(
        &self,
        customer: UserId,
        vendor: &VendorSnapshot,
        items: &[LineItemRequest],
    ) -> Result<OrderRecord, OrderError> {
        let draft = pricing::price_order(vendor, items, &self.policy.fees)?;

        let order = Order {
            id: next_order_id(),
            customer,
            vendor: vendor.id.clone(),
            items: draft.items,
            subtotal: draft.subtotal,
            delivery_fee: draft.delivery_fee,
            platform_fee: draft.platform_fee,
            total: draft.total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            accepted_at: None,
            delivered_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
        };

        let stored = self.repository.insert(OrderRecord::new(order))?;
        self.notify(
            vendor.owner.clone(),
            NotificationTemplate::OrderPlaced,
            &stored,
        );
        Ok(stored)
    }

    /// Vendor acceptance. Stamps `accepted_at` and lands directly on
    /// `PaymentPending`: accepting an order opens its payment window in the
    /// same step.
    pub fn accept(&self, order_id: &OrderId, actor: &OrderActor) -> Result<OrderRecord, OrderError> {
        let mut record = self.fetch(order_id)?;
        match actor {
            OrderActor::Vendor(vendor) if *vendor == record.order.vendor => {}
            _ => return Err(OrderError::Forbidden("only the vendor can accept an order")),
        }
        if record.order.status != OrderStatus::Pending {
            return Err(OrderError::InvalidTransition {
                from: record.order.status,
                to: OrderStatus::Accepted,
            });
        }

        record.order.status = OrderStatus::PaymentPending;
        record.order.accepted_at = Some(Utc::now());

        let stored = self.repository.update(record)?;
        self.notify(
            stored.order.customer.clone(),
            NotificationTemplate::OrderStatusChanged,
            &stored,
        );
        Ok(stored)
    }

    /// Persist the outcome reported by the payment provider webhook.
    ///
    /// A completed payment holds the full amount in escrow and moves the
    /// order to `Paid`; a failed attempt is recorded and the payment window
    /// stays open.
    pub fn record_payment(
        &self,
        order_id: &OrderId,
        provider: PaymentProvider,
        outcome: PaymentOutcome,
    ) -> Result<OrderRecord, OrderError> {
        let mut record = self.fetch(order_id)?;
        if record.order.status != OrderStatus::PaymentPending {
            return Err(OrderError::InvalidTransition {
                from: record.order.status,
                to: OrderStatus::Paid,
            });
        }

        let now = Utc::now();
        let (status, escrow) = match outcome {
            PaymentOutcome::Completed => (PaymentStatus::Completed, EscrowStatus::Held),
            PaymentOutcome::Failed => (PaymentStatus::Failed, EscrowStatus::None),
        };
        record.payment = Some(PaymentRecord {
            order_id: record.order.id.clone(),
            provider,
            amount: record.order.total,
            status,
            escrow,
            escrow_released_at: None,
            initiated_at: now,
        });
        if outcome == PaymentOutcome::Completed {
            record.order.status = OrderStatus::Paid;
        }

        let stored = self.repository.update(record)?;
        if outcome == PaymentOutcome::Completed {
            self.notify(
                stored.order.customer.clone(),
                NotificationTemplate::PaymentReceived,
                &stored,
            );
        }
        Ok(stored)
    }

    /// Table-checked status change used by vendor/delivery surfaces.
    pub fn update_status(
        &self,
        order_id: &OrderId,
        requested: OrderStatus,
    ) -> Result<OrderRecord, OrderError> {
        let mut record = self.fetch(order_id)?;
        let current = record.order.status;
        if !lifecycle::can_transition(current, requested) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: requested,
            });
        }
        if requested == OrderStatus::Refunded {
            let refunded = record
                .payment
                .as_ref()
                .map(|payment| payment.status == PaymentStatus::Refunded)
                .unwrap_or(false);
            if !refunded {
                return Err(OrderError::InvalidTransition {
                    from: current,
                    to: requested,
                });
            }
        }

        record.order.status = requested;
        let now = Utc::now();
        if requested == OrderStatus::Accepted && record.order.accepted_at.is_none() {
            record.order.accepted_at = Some(now);
        }
        if requested == OrderStatus::Delivered && record.order.delivered_at.is_none() {
            record.order.delivered_at = Some(now);
        }

        let stored = self.repository.update(record)?;
        self.notify(
            stored.order.customer.clone(),
            NotificationTemplate::OrderStatusChanged,
            &stored,
        );
        Ok(stored)
    }

    /// Customer confirmation of a delivered order. Completes the order and
    /// releases held escrow in the same write; the payout itself is the
    /// payment collaborator's job.
    pub fn confirm_delivery(
        &self,
        order_id: &OrderId,
        actor: &OrderActor,
    ) -> Result<OrderRecord, OrderError> {
        let mut record = self.fetch(order_id)?;
        match actor {
            OrderActor::Customer(customer) if *customer == record.order.customer => {}
            _ => {
                return Err(OrderError::Forbidden(
                    "only the ordering customer can confirm delivery",
                ))
            }
        }
        if record.order.status != OrderStatus::Delivered {
            return Err(OrderError::InvalidTransition {
                from: record.order.status,
                to: OrderStatus::Completed,
            });
        }

        let now = Utc::now();
        record.order.status = OrderStatus::Completed;
        record.order.completed_at = Some(now);
        if let Some(payment) = record.payment.as_mut() {
            if payment.escrow == EscrowStatus::Held {
                payment.escrow = EscrowStatus::Released;
                payment.escrow_released_at = Some(now);
            }
        }

        let stored = self.repository.update(record)?;
        self.notify(
            stored.order.customer.clone(),
            NotificationTemplate::EscrowReleased,
            &stored,
        );
        Ok(stored)
    }

    /// Cancel an order on behalf of the customer, the vendor, or an admin.
    /// A completed payment flips to refunded in the same write; fund
    /// movement is delegated to the payment collaborator.
    pub fn cancel(
        &self,
        order_id: &OrderId,
        actor: &OrderActor,
        reason: String,
    ) -> Result<OrderRecord, OrderError> {
        let mut record = self.fetch(order_id)?;
        let authorized = match actor {
            OrderActor::Customer(customer) => *customer == record.order.customer,
            OrderActor::Vendor(vendor) => *vendor == record.order.vendor,
            OrderActor::Admin(_) => true,
        };
        if !authorized {
            return Err(OrderError::Forbidden(
                "only the customer, the vendor, or an administrator can cancel",
            ));
        }
        if !lifecycle::cancellable(record.order.status) {
            return Err(OrderError::InvalidTransition {
                from: record.order.status,
                to: OrderStatus::Cancelled,
            });
        }

        record.order.status = OrderStatus::Cancelled;
        record.order.cancelled_at = Some(Utc::now());
        record.order.cancel_reason = Some(reason);
        let mut refunded = false;
        if let Some(payment) = record.payment.as_mut() {
            if payment.status == PaymentStatus::Completed {
                payment.status = PaymentStatus::Refunded;
                payment.escrow = EscrowStatus::Refunded;
                refunded = true;
            }
        }

        let stored = self.repository.update(record)?;
        let template = if refunded {
            NotificationTemplate::OrderRefunded
        } else {
            NotificationTemplate::OrderStatusChanged
        };
        self.notify(stored.order.customer.clone(), template, &stored);
        Ok(stored)
    }

    /// Customer rating on a completed order. Updates the vendor's running
    /// mean and rewards the rater.
    pub fn rate(
        &self,
        order_id: &OrderId,
        actor: &OrderActor,
        score: u8,
        comment: Option<String>,
    ) -> Result<VendorRating, OrderError> {
        debug_assert!((1..=5).contains(&score), "score is schema-validated");

        let mut record = self.fetch(order_id)?;
        match actor {
            OrderActor::Customer(customer) if *customer == record.order.customer => {}
            _ => {
                return Err(OrderError::Forbidden(
                    "only the ordering customer can rate an order",
                ))
            }
        }
        if record.order.status != OrderStatus::Completed {
            return Err(OrderError::NotCompleted);
        }
        if record.rating.is_some() {
            return Err(OrderError::AlreadyRated);
        }

        record.rating = Some(OrderRating {
            score,
            comment,
            rated_at: Utc::now(),
        });
        let customer = record.order.customer.clone();
        let vendor = record.order.vendor.clone();
        self.repository.update(record)?;

        let rating = self.repository.vendor_rating(&vendor)?.apply(score);
        self.repository.store_vendor_rating(&vendor, rating)?;
        self.ledger
            .award(&customer, self.policy.rating_reputation_award)?;
        Ok(rating)
    }

    /// Fetch an order for API responses.
    pub fn get(&self, order_id: &OrderId) -> Result<OrderRecord, OrderError> {
        self.fetch(order_id)
    }

    fn fetch(&self, order_id: &OrderId) -> Result<OrderRecord, OrderError> {
        Ok(self
            .repository
            .fetch(order_id)?
            .ok_or(StoreError::NotFound)?)
    }

    fn notify(&self, recipient: UserId, template: NotificationTemplate, record: &OrderRecord) {
        let mut details = BTreeMap::new();
        details.insert("order_id".to_string(), record.order.id.0.clone());
        details.insert(
            "status".to_string(),
            record.order.status.label().to_string(),
        );
        details.insert("total".to_string(), record.order.total.to_string());

        if let Err(err) = self.notifications.publish(Notification {
            recipient,
            template,
            details,
        }) {
            warn!(error = %err, order_id = %record.order.id.0, "order notification failed");
        }
    }
}
