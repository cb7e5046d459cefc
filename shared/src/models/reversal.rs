//! Sale-reversal planning models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a sale item the reversal planner needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemReversal {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Set when the unit was allocated from a non-fungible prize pool
    /// instead of ordinary product stock
    pub ichiban_kuji_prize_id: Option<Uuid>,
}

/// What undoing a confirmed sale must restore, aggregated per target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReversalPlan {
    /// `(prize_id, quantity)` to add back to each prize pool's remaining
    pub prize_restores: Vec<(Uuid, i32)>,
    /// `(product_id, quantity)` compensating stock deltas
    pub product_restocks: Vec<(Uuid, i32)>,
}
