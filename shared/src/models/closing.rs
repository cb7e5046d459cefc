//! Day-closing aggregation models

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a sale the day-closing aggregator needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSummary {
    pub total: Decimal,
    pub payment_method: String,
    pub account_id: Option<Uuid>,
    pub is_paid: bool,
}

/// Point-in-time sales/payment statistics for one closing period
///
/// Totals include unpaid sales; the `paid_*` / `unpaid_*` groups split the
/// same population by `is_paid`. The per-account breakdown covers paid
/// sales only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClosingStats {
    pub sales_count: i32,

    pub total_sales: Decimal,
    pub total_cash: Decimal,
    pub total_card: Decimal,
    pub total_transfer: Decimal,
    pub total_cod: Decimal,

    pub paid_count: i32,
    pub paid_sales: Decimal,
    pub paid_cash: Decimal,
    pub paid_card: Decimal,
    pub paid_transfer: Decimal,
    pub paid_cod: Decimal,

    pub unpaid_count: i32,
    pub unpaid_sales: Decimal,
    pub unpaid_cash: Decimal,
    pub unpaid_card: Decimal,
    pub unpaid_transfer: Decimal,
    pub unpaid_cod: Decimal,

    pub sales_by_account: BTreeMap<Uuid, Decimal>,
}

/// AR/AP aging buckets keyed on days overdue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgingBuckets {
    /// Not yet due, or overdue by at most 30 days
    pub current: Decimal,
    pub days_31_60: Decimal,
    pub days_61_90: Decimal,
    pub over_90: Decimal,
    pub total: Decimal,
}
