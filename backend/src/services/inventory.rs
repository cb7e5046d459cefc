//! Inventory adjuster: the single entry point for product stock mutation
//!
//! Every stock change goes through [`apply_delta`] inside the calling
//! workflow's transaction. The inventory log is written first with the
//! `(ref_type, ref_id, product_id)` uniqueness constraint as the
//! idempotency guard: when the log row already exists the event was
//! processed before and the stock update is skipped.

use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::reconcile::weighted_average_cost;

/// A signed stock change attributed to a source event
#[derive(Debug)]
pub struct StockDelta<'a> {
    pub product_id: Uuid,
    /// Signed quantity change; positive receives stock, negative removes it
    pub qty_change: i32,
    /// Unit cost of the received goods; drives the weighted-average
    /// recomputation on positive deltas
    pub unit_cost: Option<Decimal>,
    pub ref_type: &'a str,
    pub ref_id: Uuid,
    pub memo: String,
}

/// Apply a stock delta and append its audit log entry.
///
/// Returns the updated stock, or `None` when the same `(ref_type, ref_id,
/// product_id)` event was already applied. Stock never goes negative; an
/// over-withdrawal fails the caller's whole transaction.
pub async fn apply_delta(
    tx: &mut Transaction<'_, Postgres>,
    delta: &StockDelta<'_>,
) -> AppResult<Option<i32>> {
    let logged = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO inventory_logs (product_id, ref_type, ref_id, qty_change, memo)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (ref_type, ref_id, product_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(delta.product_id)
    .bind(delta.ref_type)
    .bind(delta.ref_id)
    .bind(delta.qty_change)
    .bind(&delta.memo)
    .fetch_optional(&mut **tx)
    .await?;

    if logged.is_none() {
        tracing::debug!(
            ref_type = delta.ref_type,
            ref_id = %delta.ref_id,
            product_id = %delta.product_id,
            "inventory delta already applied, skipping"
        );
        return Ok(None);
    }

    // Lock the product row to serialize concurrent stock mutations
    let (old_stock, old_avg_cost) = sqlx::query_as::<_, (i32, Decimal)>(
        "SELECT stock, avg_cost FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(delta.product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let new_stock = old_stock + delta.qty_change;
    if new_stock < 0 {
        return Err(AppError::InsufficientInventory(format!(
            "Product {} has {} in stock, cannot remove {}",
            delta.product_id, old_stock, -delta.qty_change
        )));
    }

    let new_avg_cost = match delta.unit_cost {
        Some(unit_cost) if delta.qty_change > 0 => {
            weighted_average_cost(old_stock, old_avg_cost, delta.qty_change, unit_cost)
        }
        _ => old_avg_cost,
    };

    sqlx::query("UPDATE products SET stock = $1, avg_cost = $2, updated_at = now() WHERE id = $3")
        .bind(new_stock)
        .bind(new_avg_cost)
        .bind(delta.product_id)
        .execute(&mut **tx)
        .await?;

    tracing::debug!(
        product_id = %delta.product_id,
        old_stock,
        new_stock,
        %old_avg_cost,
        %new_avg_cost,
        ref_type = delta.ref_type,
        "applied inventory delta"
    );

    Ok(Some(new_stock))
}
