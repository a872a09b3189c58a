//! Order pricing and validation: pure computation over caller-supplied
//! vendor/product snapshots. No side effects.

use serde::{Deserialize, Serialize};

use super::domain::{LineItem, VendorSnapshot};
use crate::identity::ProductId;
use crate::scoring::{platform_fee, FeeSchedule};

/// Requested order line before pricing. Quantity is schema-validated to be
/// at least 1 by the calling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Validation errors raised while pricing an order.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("vendor is inactive or unverified")]
    VendorUnavailable,
    #[error("product {0:?} is not in the vendor catalog")]
    ProductNotFound(ProductId),
    #[error("product {0:?} is currently unavailable")]
    ProductUnavailable(ProductId),
    #[error("order subtotal is below the vendor minimum of {minimum}")]
    MinimumOrderNotMet { minimum: i64 },
}

/// A priced order draft ready to be persisted as a pending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub platform_fee: i64,
    pub total: i64,
}

/// Price the requested lines against the vendor snapshot.
///
/// Unit prices are read here and become the immutable line snapshots of the
/// resulting order.
pub fn price_order(
    vendor: &VendorSnapshot,
    requested: &[LineItemRequest],
    fees: &FeeSchedule,
) -> Result<OrderDraft, PricingError> {
    if !vendor.is_active || !vendor.is_verified {
        return Err(PricingError::VendorUnavailable);
    }

    let mut items = Vec::with_capacity(requested.len());
    let mut subtotal: i64 = 0;
    for request in requested {
        let product = vendor
            .products
            .iter()
            .find(|product| product.id == request.product_id)
            .ok_or_else(|| PricingError::ProductNotFound(request.product_id.clone()))?;
        if !product.is_available {
            return Err(PricingError::ProductUnavailable(product.id.clone()));
        }

        let line_total = product.unit_price * i64::from(request.quantity);
        subtotal += line_total;
        items.push(LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: request.quantity,
            unit_price: product.unit_price,
            line_total,
        });
    }

    if subtotal < vendor.min_order {
        return Err(PricingError::MinimumOrderNotMet {
            minimum: vendor.min_order,
        });
    }

    let fee = platform_fee(subtotal, fees);
    Ok(OrderDraft {
        items,
        subtotal,
        delivery_fee: vendor.delivery_fee,
        platform_fee: fee,
        total: subtotal + vendor.delivery_fee + fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ProductId, UserId, VendorId};
    use crate::marketplace::domain::ProductSnapshot;

    fn vendor() -> VendorSnapshot {
        VendorSnapshot {
            id: VendorId("ven-1".to_string()),
            owner: UserId("usr-vendor".to_string()),
            is_active: true,
            is_verified: true,
            delivery_fee: 1_500,
            min_order: 10_000,
            products: vec![
                ProductSnapshot {
                    id: ProductId("prd-jerrycan".to_string()),
                    name: "20L jerrycan".to_string(),
                    unit_price: 5_000,
                    is_available: true,
                },
                ProductSnapshot {
                    id: ProductId("prd-tank".to_string()),
                    name: "1000L tank refill".to_string(),
                    unit_price: 45_000,
                    is_available: false,
                },
            ],
        }
    }

    fn request(product: &str, quantity: u32) -> LineItemRequest {
        LineItemRequest {
            product_id: ProductId(product.to_string()),
            quantity,
        }
    }

    #[test]
    fn prices_lines_and_totals_exactly() {
        let draft = price_order(
            &vendor(),
            &[request("prd-jerrycan", 4)],
            &FeeSchedule::default(),
        )
        .expect("order prices");

        assert_eq!(draft.subtotal, 20_000);
        assert_eq!(draft.platform_fee, 1_000);
        assert_eq!(draft.delivery_fee, 1_500);
        assert_eq!(draft.total, 22_500);
        assert_eq!(draft.items[0].line_total, 20_000);
        assert_eq!(
            draft.subtotal,
            draft
                .items
                .iter()
                .map(|line| line.unit_price * i64::from(line.quantity))
                .sum::<i64>()
        );
    }

    #[test]
    fn rejects_subtotal_below_vendor_minimum() {
        match price_order(
            &vendor(),
            &[request("prd-jerrycan", 1)],
            &FeeSchedule::default(),
        ) {
            Err(PricingError::MinimumOrderNotMet { minimum }) => assert_eq!(minimum, 10_000),
            other => panic!("expected minimum-order error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_inactive_or_unverified_vendor() {
        let mut inactive = vendor();
        inactive.is_active = false;
        assert!(matches!(
            price_order(
                &inactive,
                &[request("prd-jerrycan", 4)],
                &FeeSchedule::default()
            ),
            Err(PricingError::VendorUnavailable)
        ));

        let mut unverified = vendor();
        unverified.is_verified = false;
        assert!(matches!(
            price_order(
                &unverified,
                &[request("prd-jerrycan", 4)],
                &FeeSchedule::default()
            ),
            Err(PricingError::VendorUnavailable)
        ));
    }

    #[test]
    fn rejects_unknown_and_unavailable_products() {
        assert!(matches!(
            price_order(&vendor(), &[request("prd-ice", 2)], &FeeSchedule::default()),
            Err(PricingError::ProductNotFound(_))
        ));
        assert!(matches!(
            price_order(
                &vendor(),
                &[request("prd-tank", 1)],
                &FeeSchedule::default()
            ),
            Err(PricingError::ProductUnavailable(_))
        ));
    }
}
