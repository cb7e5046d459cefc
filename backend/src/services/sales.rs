//! Sale lookup, payment updates and reversal
//!
//! Deleting a confirmed sale restores prize pools and product stock before
//! the row goes away; ledger entries raised by the sale are removed in the
//! same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::inventory;
use shared::models::SaleItemReversal;
use shared::reconcile::plan_sale_reversal;
use shared::types::DocumentStatus;

#[derive(Debug, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub sale_no: String,
    pub customer_code: Option<String>,
    pub source: String,
    pub status: String,
    pub fulfillment_status: Option<String>,
    pub is_paid: bool,
    pub payment_method: String,
    pub account_id: Option<Uuid>,
    pub total: Decimal,
    pub sale_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SaleItemDetail {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub cost: Decimal,
    pub subtotal: Decimal,
    pub snapshot_name: Option<String>,
    pub ichiban_kuji_id: Option<Uuid>,
    pub ichiban_kuji_prize_id: Option<Uuid>,
    pub item_code: String,
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItemDetail>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSalePayment {
    pub payment_method: String,
    pub account_id: Option<Uuid>,
    pub is_paid: Option<bool>,
}

#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
}

impl SaleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, sale_id: Uuid) -> AppResult<SaleDetail> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(sale_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT si.id, si.sale_id, si.product_id, si.quantity, si.price, si.cost,
                   si.subtotal, si.snapshot_name, si.ichiban_kuji_id, si.ichiban_kuji_prize_id,
                   p.item_code, p.name, p.unit
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = $1
            ORDER BY si.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleDetail { sale, items })
    }

    /// Amend how a sale was paid without touching its line items.
    pub async fn update_payment(&self, sale_id: Uuid, input: UpdateSalePayment) -> AppResult<Sale> {
        if input.payment_method.trim().is_empty() {
            return Err(AppError::ValidationError(
                "payment_method must not be empty".to_string(),
            ));
        }

        sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET payment_method = $1,
                account_id = COALESCE($2, account_id),
                is_paid = COALESCE($3, is_paid),
                updated_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&input.payment_method)
        .bind(input.account_id)
        .bind(input.is_paid)
        .bind(sale_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// Delete a sale, restoring inventory and prize pools for confirmed
    /// sales and removing the receivables it raised.
    pub async fn delete(&self, sale_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let status: String = sqlx::query_scalar("SELECT status FROM sales WHERE id = $1 FOR UPDATE")
            .bind(sale_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        // Draft and cancelled sales never moved stock
        if status == DocumentStatus::Confirmed.as_str() {
            let items: Vec<SaleItemReversal> = sqlx::query_as::<_, (Uuid, i32, Option<Uuid>)>(
                "SELECT product_id, quantity, ichiban_kuji_prize_id FROM sale_items WHERE sale_id = $1",
            )
            .bind(sale_id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|(product_id, quantity, ichiban_kuji_prize_id)| SaleItemReversal {
                product_id,
                quantity,
                ichiban_kuji_prize_id,
            })
            .collect();

            let plan = plan_sale_reversal(&items);

            for (prize_id, quantity) in &plan.prize_restores {
                let updated =
                    sqlx::query("UPDATE ichiban_kuji_prizes SET remaining = remaining + $1 WHERE id = $2")
                        .bind(quantity)
                        .bind(prize_id)
                        .execute(&mut *tx)
                        .await?;
                if updated.rows_affected() == 0 {
                    return Err(AppError::NotFound("Prize".to_string()));
                }
            }

            for (product_id, quantity) in &plan.product_restocks {
                inventory::apply_delta(
                    &mut tx,
                    &inventory::StockDelta {
                        product_id: *product_id,
                        qty_change: *quantity,
                        unit_cost: None,
                        ref_type: "sale_reversal",
                        ref_id: sale_id,
                        memo: format!("Restock from deleted sale {}", sale_id),
                    },
                )
                .await?;
            }
        }

        sqlx::query(
            r#"
            DELETE FROM partner_accounts
            WHERE (ref_type = 'sale' AND ref_id = $1)
               OR sale_item_id IN (SELECT id FROM sale_items WHERE sale_id = $1)
            "#,
        )
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%sale_id, status, "sale deleted");
        Ok(())
    }
}
