//! Vendor marketplace: order pricing and validation, the order/escrow
//! lifecycle state machine, payment recording, and vendor ratings.

pub mod domain;
pub mod lifecycle;
pub mod pricing;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    EscrowStatus, LineItem, Order, OrderActor, OrderRating, OrderStatus, PaymentProvider,
    PaymentRecord, PaymentStatus, ProductSnapshot, VendorSnapshot,
};
pub use pricing::{price_order, LineItemRequest, OrderDraft, PricingError};
pub use repository::{OrderRecord, OrderRepository, OrderStatusView, VendorRating};
pub use router::order_router;
pub use service::{OrderError, OrderPolicy, OrderService, PaymentOutcome};
