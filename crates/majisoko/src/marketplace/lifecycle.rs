//! The order status transition table.
//!
//! One table, checked in one place; call sites never test statuses ad hoc.
//! `Cancelled -> Refunded` carries an extra guard in the service: it is only
//! taken once the order's payment has actually been refunded.

use super::domain::OrderStatus;

/// Allowed next statuses for each current status.
pub fn allowed_next(status: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match status {
        Pending => &[Accepted, Cancelled],
        Accepted => &[PaymentPending, Cancelled],
        PaymentPending => &[Paid, Cancelled],
        Paid => &[Preparing],
        Preparing => &[OutForDelivery, Cancelled],
        OutForDelivery => &[Delivered],
        Delivered => &[Completed],
        Completed => &[],
        Cancelled => &[Refunded],
        Refunded => &[],
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_next(from).contains(&to)
}

/// Statuses from which a cancel request is still honored.
pub fn cancellable(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Pending
            | OrderStatus::Accepted
            | OrderStatus::PaymentPending
            | OrderStatus::Paid
            | OrderStatus::Preparing
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL: [OrderStatus; 10] = [
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
    ];

    #[test]
    fn table_matches_the_documented_lifecycle() {
        assert_eq!(allowed_next(Pending), &[Accepted, Cancelled]);
        assert_eq!(allowed_next(Accepted), &[PaymentPending, Cancelled]);
        assert_eq!(allowed_next(PaymentPending), &[Paid, Cancelled]);
        assert_eq!(allowed_next(Paid), &[Preparing]);
        assert_eq!(allowed_next(Preparing), &[OutForDelivery, Cancelled]);
        assert_eq!(allowed_next(OutForDelivery), &[Delivered]);
        assert_eq!(allowed_next(Delivered), &[Completed]);
        assert!(allowed_next(Completed).is_empty());
        assert_eq!(allowed_next(Cancelled), &[Refunded]);
        assert!(allowed_next(Refunded).is_empty());
    }

    #[test]
    fn every_pair_outside_the_table_is_rejected() {
        for from in ALL {
            for to in ALL {
                let expected = allowed_next(from).contains(&to);
                assert_eq!(
                    can_transition(from, to),
                    expected,
                    "{} -> {}",
                    from.label(),
                    to.label()
                );
            }
        }
    }

    #[test]
    fn cancellable_set_excludes_post_delivery_states() {
        for status in [Pending, Accepted, PaymentPending, Paid, Preparing] {
            assert!(cancellable(status), "{} should cancel", status.label());
        }
        for status in [OutForDelivery, Delivered, Completed, Cancelled, Refunded] {
            assert!(!cancellable(status), "{} should not cancel", status.label());
        }
    }
}
