use proptest::prelude::*;
use rust_decimal::Decimal;
use stockroom_api::entities::purchase_order::PaymentStatus;
use stockroom_api::entities::purchase_order_line::LineStatus;
use stockroom_api::entities::stock_entry::{available_stock, StockStatus};
use stockroom_api::services::reorder::Urgency;
use stockroom_api::services::stock_ledger::weighted_average_cost;

proptest! {
    #[test]
    fn available_is_never_negative(current in 0..100_000i32, reserved in 0..100_000i32) {
        let available = available_stock(current, reserved);
        prop_assert!(available >= 0);
        prop_assert_eq!(available, (current - reserved).max(0));
        prop_assert!(available <= current);
    }

    #[test]
    fn status_derivation_matches_thresholds(current in 0..10_000i32, min in 0..10_000i32) {
        let status = StockStatus::derive(current, min, StockStatus::InStock);
        match status {
            StockStatus::OutOfStock => prop_assert_eq!(current, 0),
            StockStatus::LowStock => {
                prop_assert!(current > 0);
                prop_assert!(current <= min);
            }
            StockStatus::InStock => prop_assert!(current > min),
            StockStatus::Discontinued => prop_assert!(false, "cannot derive discontinued"),
        }
    }

    #[test]
    fn discontinued_is_always_sticky(current in 0..10_000i32, min in 0..10_000i32) {
        prop_assert_eq!(
            StockStatus::derive(current, min, StockStatus::Discontinued),
            StockStatus::Discontinued
        );
    }

    #[test]
    fn line_status_tracks_received_quantity(ordered in 1..10_000i32, received in 0..20_000i32) {
        let status = LineStatus::derive(ordered, received, LineStatus::Pending);
        match status {
            LineStatus::Pending => prop_assert_eq!(received, 0),
            LineStatus::Partial => {
                prop_assert!(received > 0);
                prop_assert!(received < ordered);
            }
            LineStatus::Received => prop_assert!(received >= ordered),
            LineStatus::Cancelled => prop_assert!(false, "cannot derive cancelled"),
        }
    }

    #[test]
    fn cancelled_lines_stay_cancelled(ordered in 1..10_000i32, received in 0..20_000i32) {
        prop_assert_eq!(
            LineStatus::derive(ordered, received, LineStatus::Cancelled),
            LineStatus::Cancelled
        );
    }

    #[test]
    fn payment_status_partitions_the_paid_range(paid in 0..1_000_000i64, total in 1..1_000_000i64) {
        let status = PaymentStatus::derive(Decimal::from(paid), Decimal::from(total));
        match status {
            PaymentStatus::Pending => prop_assert_eq!(paid, 0),
            PaymentStatus::Partial => {
                prop_assert!(paid > 0);
                prop_assert!(paid < total);
            }
            PaymentStatus::Paid => prop_assert!(paid >= total),
        }
    }

    #[test]
    fn average_cost_stays_between_the_blended_costs(
        previous_quantity in 0..10_000i32,
        previous_average_cents in 0..1_000_000i64,
        quantity in 1..10_000i32,
        unit_cost_cents in 0..1_000_000i64,
    ) {
        let previous_average = Decimal::new(previous_average_cents, 2);
        let unit_cost = Decimal::new(unit_cost_cents, 2);
        let average = weighted_average_cost(previous_quantity, previous_average, quantity, unit_cost);

        let low = previous_average.min(unit_cost);
        let high = previous_average.max(unit_cost);
        if previous_quantity == 0 {
            prop_assert_eq!(average, unit_cost);
        } else {
            prop_assert!(average >= low);
            prop_assert!(average <= high);
        }
    }

    #[test]
    fn urgency_is_total_and_ordered(current in 0..10_000i32, min in 0..10_000i32) {
        let urgency = Urgency::classify(current, min);
        match urgency {
            Urgency::Critical => prop_assert_eq!(current, 0),
            Urgency::High => {
                prop_assert!(current > 0);
                prop_assert!(current <= min / 2);
            }
            Urgency::Medium => prop_assert!(current > min / 2),
        }
    }
}
