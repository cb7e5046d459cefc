//! Pure reconciliation logic for inventory, receiving, reversal and
//! day-closing flows
//!
//! Everything here is side-effect free so the invariants can be tested
//! without a database. The backend services feed these functions with rows
//! they read inside a transaction and persist whatever comes back.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AgingBuckets, ClosingStats, ReceivingProgress, SaleItemReversal, SaleReversalPlan,
    SaleSummary,
};
use crate::types::{PaymentCategory, ReceivingStatus};

// ============================================================================
// Inventory costing
// ============================================================================

/// Weighted-average cost after receiving `delta` units at `unit_cost`.
///
/// `new_avg = (old_stock * old_avg + delta * unit_cost) / (old_stock + delta)`
///
/// When the resulting stock is zero or negative the prior average is
/// retained; dividing by zero would otherwise wipe the costing history.
pub fn weighted_average_cost(
    old_stock: i32,
    old_avg_cost: Decimal,
    delta: i32,
    unit_cost: Decimal,
) -> Decimal {
    let new_stock = old_stock + delta;
    if new_stock <= 0 {
        return old_avg_cost;
    }
    (Decimal::from(old_stock) * old_avg_cost + Decimal::from(delta) * unit_cost)
        / Decimal::from(new_stock)
}

// ============================================================================
// Receiving
// ============================================================================

/// Why a requested receipt quantity was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReceiveQuantityError {
    #[error("receive quantity must be greater than 0")]
    NotPositive,
    #[error("receive quantity exceeds remaining quantity ({remaining} remaining)")]
    ExceedsRemaining { remaining: i32 },
}

/// Validate a receipt of `requested` units against a line that ordered
/// `ordered` and has already received `received`.
pub fn validate_receive_quantity(
    ordered: i32,
    received: i32,
    requested: i32,
) -> Result<(), ReceiveQuantityError> {
    if requested <= 0 {
        return Err(ReceiveQuantityError::NotPositive);
    }
    let remaining = ordered - received;
    if requested > remaining {
        return Err(ReceiveQuantityError::ExceedsRemaining { remaining });
    }
    Ok(())
}

/// Derive a purchase order's receiving status from its lines.
///
/// Completed iff every line is fully received, partial iff any quantity has
/// been received, none otherwise. There is no independent source of truth
/// for this value; it is recomputed on every relevant mutation.
pub fn derive_receiving_status(items: &[ReceivingProgress]) -> ReceivingStatus {
    if !items.is_empty() && items.iter().all(|i| i.is_received) {
        ReceivingStatus::Completed
    } else if items.iter().any(|i| i.received_quantity > 0) {
        ReceivingStatus::Partial
    } else {
        ReceivingStatus::None
    }
}

/// Format a sequential document code, e.g. `R000042` for receiving batches
/// and `D000007` for deliveries.
pub fn format_doc_code(prefix: &str, sequence: i64) -> String {
    format!("{}{:06}", prefix, sequence)
}

// ============================================================================
// Sale reversal
// ============================================================================

/// Plan the inventory restoration for deleting a confirmed sale.
///
/// Units allocated from a prize pool go back to that pool's `remaining`;
/// everything else gets a compensating product stock delta. Quantities are
/// aggregated per target so each restoration is a single logged event.
pub fn plan_sale_reversal(items: &[SaleItemReversal]) -> SaleReversalPlan {
    let mut prizes: BTreeMap<Uuid, i32> = BTreeMap::new();
    let mut products: BTreeMap<Uuid, i32> = BTreeMap::new();

    for item in items {
        match item.ichiban_kuji_prize_id {
            Some(prize_id) => *prizes.entry(prize_id).or_default() += item.quantity,
            None => *products.entry(item.product_id).or_default() += item.quantity,
        }
    }

    SaleReversalPlan {
        prize_restores: prizes.into_iter().collect(),
        product_restocks: products.into_iter().collect(),
    }
}

/// Aggregate delivery lines into one stock debit per product.
///
/// The delivery-keyed inventory log admits a single event per product, so
/// repeated lines for the same product must collapse into one debit before
/// they reach the log.
pub fn plan_delivery_debits(items: &[(Uuid, i32)]) -> Vec<(Uuid, i32)> {
    let mut debits: BTreeMap<Uuid, i32> = BTreeMap::new();
    for (product_id, quantity) in items {
        *debits.entry(*product_id).or_default() += quantity;
    }
    debits.into_iter().collect()
}

// ============================================================================
// Day closing
// ============================================================================

/// Bucket a payment method for closing statistics.
pub fn categorize_payment(method: &str) -> Option<PaymentCategory> {
    match method {
        "cash" => Some(PaymentCategory::Cash),
        "card" => Some(PaymentCategory::Card),
        "cod" => Some(PaymentCategory::Cod),
        m if m.starts_with("transfer_") => Some(PaymentCategory::Transfer),
        _ => None,
    }
}

/// Aggregate confirmed sales into closing statistics.
///
/// Zero-amount sales are counted like any other sale; a checkpoint must
/// partition every confirmed sale of its period.
pub fn tally_closing_stats(sales: &[SaleSummary]) -> ClosingStats {
    let mut stats = ClosingStats {
        sales_count: sales.len() as i32,
        ..ClosingStats::default()
    };

    for sale in sales {
        stats.total_sales += sale.total;
        match categorize_payment(&sale.payment_method) {
            Some(PaymentCategory::Cash) => stats.total_cash += sale.total,
            Some(PaymentCategory::Card) => stats.total_card += sale.total,
            Some(PaymentCategory::Cod) => stats.total_cod += sale.total,
            Some(PaymentCategory::Transfer) => stats.total_transfer += sale.total,
            None => {}
        }

        if sale.is_paid {
            stats.paid_count += 1;
            stats.paid_sales += sale.total;
            match categorize_payment(&sale.payment_method) {
                Some(PaymentCategory::Cash) => stats.paid_cash += sale.total,
                Some(PaymentCategory::Card) => stats.paid_card += sale.total,
                Some(PaymentCategory::Cod) => stats.paid_cod += sale.total,
                Some(PaymentCategory::Transfer) => stats.paid_transfer += sale.total,
                None => {}
            }
            if let Some(account_id) = sale.account_id {
                *stats.sales_by_account.entry(account_id).or_default() += sale.total;
            }
        } else {
            stats.unpaid_count += 1;
            stats.unpaid_sales += sale.total;
            match categorize_payment(&sale.payment_method) {
                Some(PaymentCategory::Cash) => stats.unpaid_cash += sale.total,
                Some(PaymentCategory::Card) => stats.unpaid_card += sale.total,
                Some(PaymentCategory::Cod) => stats.unpaid_cod += sale.total,
                Some(PaymentCategory::Transfer) => stats.unpaid_transfer += sale.total,
                None => {}
            }
        }
    }

    stats
}

/// Midnight of the current day in the business reference timezone,
/// expressed in UTC. Used as the lower bound of the first closing period of
/// a source (e.g. UTC+8 midnight is 16:00 UTC of the previous day).
pub fn reference_midnight(now: DateTime<Utc>, offset_hours: i32) -> DateTime<Utc> {
    let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| Utc.fix());
    now.with_timezone(&tz)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(tz).single())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Current calendar date in the business reference timezone.
pub fn reference_today(now: DateTime<Utc>, offset_hours: i32) -> NaiveDate {
    let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| Utc.fix());
    now.with_timezone(&tz).date_naive()
}

// ============================================================================
// AR/AP aging
// ============================================================================

/// Days elapsed from `from` to `to`; negative when `from` lies in the
/// future.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

impl AgingBuckets {
    /// Add a balance that is `days_overdue` days past its due date
    /// (non-positive means not yet due).
    pub fn add(&mut self, days_overdue: i64, balance: Decimal) {
        self.total += balance;
        if days_overdue <= 30 {
            self.current += balance;
        } else if days_overdue <= 60 {
            self.days_31_60 += balance;
        } else if days_overdue <= 90 {
            self.days_61_90 += balance;
        } else {
            self.over_90 += balance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn weighted_average_blends_proportionally() {
        // stock 10 @ 5.0, receive 5 @ 8.0 -> 15 @ 6.0
        let avg = weighted_average_cost(10, dec!(5.0), 5, dec!(8.0));
        assert_eq!(avg, dec!(6.0));
    }

    #[test]
    fn weighted_average_retains_prior_on_zero_stock() {
        let avg = weighted_average_cost(5, dec!(12.5), -5, dec!(0));
        assert_eq!(avg, dec!(12.5));
    }

    #[test]
    fn weighted_average_first_receipt_takes_unit_cost() {
        let avg = weighted_average_cost(0, dec!(0), 10, dec!(3.25));
        assert_eq!(avg, dec!(3.25));
    }

    #[test]
    fn receive_quantity_must_be_positive() {
        assert_eq!(
            validate_receive_quantity(10, 0, 0),
            Err(ReceiveQuantityError::NotPositive)
        );
        assert_eq!(
            validate_receive_quantity(10, 0, -3),
            Err(ReceiveQuantityError::NotPositive)
        );
    }

    #[test]
    fn receive_quantity_cannot_exceed_remaining() {
        // ordered 10, received 8: at most 2 more
        assert_eq!(
            validate_receive_quantity(10, 8, 5),
            Err(ReceiveQuantityError::ExceedsRemaining { remaining: 2 })
        );
        assert!(validate_receive_quantity(10, 8, 2).is_ok());
    }

    #[test]
    fn receiving_status_none_partial_completed() {
        let none = [
            ReceivingProgress { received_quantity: 0, is_received: false },
            ReceivingProgress { received_quantity: 0, is_received: false },
        ];
        assert_eq!(derive_receiving_status(&none), ReceivingStatus::None);

        let partial = [
            ReceivingProgress { received_quantity: 3, is_received: false },
            ReceivingProgress { received_quantity: 0, is_received: false },
        ];
        assert_eq!(derive_receiving_status(&partial), ReceivingStatus::Partial);

        let completed = [
            ReceivingProgress { received_quantity: 5, is_received: true },
            ReceivingProgress { received_quantity: 2, is_received: true },
        ];
        assert_eq!(derive_receiving_status(&completed), ReceivingStatus::Completed);
    }

    #[test]
    fn receiving_status_empty_order_is_none() {
        assert_eq!(derive_receiving_status(&[]), ReceivingStatus::None);
    }

    #[test]
    fn payment_categories_match_exact_and_prefix() {
        assert_eq!(categorize_payment("cash"), Some(PaymentCategory::Cash));
        assert_eq!(categorize_payment("card"), Some(PaymentCategory::Card));
        assert_eq!(categorize_payment("cod"), Some(PaymentCategory::Cod));
        assert_eq!(
            categorize_payment("transfer_bank_a"),
            Some(PaymentCategory::Transfer)
        );
        assert_eq!(categorize_payment("voucher"), None);
    }

    #[test]
    fn reversal_plan_splits_prizes_from_products() {
        let product = Uuid::new_v4();
        let prize = Uuid::new_v4();
        let items = [
            SaleItemReversal {
                product_id: product,
                quantity: 2,
                ichiban_kuji_prize_id: None,
            },
            SaleItemReversal {
                product_id: product,
                quantity: 1,
                ichiban_kuji_prize_id: Some(prize),
            },
        ];
        let plan = plan_sale_reversal(&items);
        assert_eq!(plan.prize_restores, vec![(prize, 1)]);
        assert_eq!(plan.product_restocks, vec![(product, 2)]);
    }

    #[test]
    fn reversal_plan_aggregates_per_product() {
        let product = Uuid::new_v4();
        let items = [
            SaleItemReversal {
                product_id: product,
                quantity: 2,
                ichiban_kuji_prize_id: None,
            },
            SaleItemReversal {
                product_id: product,
                quantity: 3,
                ichiban_kuji_prize_id: None,
            },
        ];
        let plan = plan_sale_reversal(&items);
        assert_eq!(plan.product_restocks, vec![(product, 5)]);
    }

    #[test]
    fn delivery_debits_merge_repeated_product_lines() {
        let product = Uuid::new_v4();
        let other = Uuid::new_v4();
        let debits = plan_delivery_debits(&[(product, 3), (other, 1), (product, 3)]);
        let merged = debits.iter().find(|(id, _)| *id == product);
        assert_eq!(merged.map(|(_, q)| *q), Some(6));
        assert_eq!(debits.len(), 2);
    }

    #[test]
    fn delivery_debits_conserve_units() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = [(a, 2), (b, 5), (a, 1), (b, 4)];
        let debits = plan_delivery_debits(&items);
        let before: i32 = items.iter().map(|(_, q)| q).sum();
        let after: i32 = debits.iter().map(|(_, q)| q).sum();
        assert_eq!(before, after);
    }

    #[test]
    fn reference_midnight_is_previous_utc_evening() {
        // 2024-06-15 03:00 UTC is 11:00 in UTC+8; that day's local midnight
        // is 2024-06-14 16:00 UTC
        let now = DateTime::parse_from_rfc3339("2024-06-15T03:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let midnight = reference_midnight(now, 8);
        assert_eq!(midnight.to_rfc3339(), "2024-06-14T16:00:00+00:00");
    }

    #[test]
    fn reference_midnight_rolls_local_date_forward() {
        // 2024-06-15 20:00 UTC is already 2024-06-16 04:00 in UTC+8
        let now = DateTime::parse_from_rfc3339("2024-06-15T20:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let midnight = reference_midnight(now, 8);
        assert_eq!(midnight.to_rfc3339(), "2024-06-15T16:00:00+00:00");
    }

    #[test]
    fn aging_buckets_boundaries() {
        let mut buckets = AgingBuckets::default();
        buckets.add(-5, dec!(100)); // not yet due
        buckets.add(30, dec!(10));
        buckets.add(31, dec!(20));
        buckets.add(60, dec!(30));
        buckets.add(61, dec!(40));
        buckets.add(90, dec!(50));
        buckets.add(91, dec!(60));

        assert_eq!(buckets.current, dec!(110));
        assert_eq!(buckets.days_31_60, dec!(50));
        assert_eq!(buckets.days_61_90, dec!(90));
        assert_eq!(buckets.over_90, dec!(60));
        assert_eq!(buckets.total, dec!(310));
    }

    #[test]
    fn doc_codes_are_zero_padded() {
        assert_eq!(format_doc_code("R", 42), "R000042");
        assert_eq!(format_doc_code("D", 1_234_567), "D1234567");
    }
}
