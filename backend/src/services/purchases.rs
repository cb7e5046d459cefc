//! Purchase lookup and reversal
//!
//! Deleting a purchase backs already-received quantities out of stock and
//! drops the payables it raised, all in one transaction. Receiving batches
//! and line items go away with the purchase via cascade.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::inventory;

#[derive(Debug, Serialize, FromRow)]
pub struct Purchase {
    pub id: Uuid,
    pub purchase_no: String,
    pub vendor_code: Option<String>,
    pub receiving_status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PurchaseItemDetail {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub received_quantity: i32,
    pub is_received: bool,
    pub cost: Decimal,
    pub item_code: String,
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItemDetail>,
}

#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
}

impl PurchaseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, purchase_id: Uuid) -> AppResult<PurchaseDetail> {
        let purchase = sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
            .bind(purchase_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;

        let items = sqlx::query_as::<_, PurchaseItemDetail>(
            r#"
            SELECT pi.id, pi.purchase_id, pi.product_id, pi.quantity,
                   pi.received_quantity, pi.is_received, pi.cost,
                   p.item_code, p.name, p.unit
            FROM purchase_items pi
            JOIN products p ON p.id = pi.product_id
            WHERE pi.purchase_id = $1
            ORDER BY pi.id
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseDetail { purchase, items })
    }

    /// Delete a purchase, backing out any received stock.
    pub async fn delete(&self, purchase_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM purchases WHERE id = $1 FOR UPDATE")
            .bind(purchase_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;

        let lines = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT product_id, received_quantity FROM purchase_items WHERE purchase_id = $1",
        )
        .bind(purchase_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut received: BTreeMap<Uuid, i32> = BTreeMap::new();
        for (product_id, qty) in lines {
            if qty > 0 {
                *received.entry(product_id).or_insert(0) += qty;
            }
        }

        // Fails with 422 if the received goods were already sold on
        for (product_id, quantity) in &received {
            inventory::apply_delta(
                &mut tx,
                &inventory::StockDelta {
                    product_id: *product_id,
                    qty_change: -quantity,
                    unit_cost: None,
                    ref_type: "purchase_reversal",
                    ref_id: purchase_id,
                    memo: format!("Stock backed out for deleted purchase {}", purchase_id),
                },
            )
            .await?;
        }

        sqlx::query(
            r#"
            DELETE FROM partner_accounts
            WHERE (ref_type = 'purchase' AND ref_id = $1)
               OR purchase_item_id IN (SELECT id FROM purchase_items WHERE purchase_id = $1)
            "#,
        )
        .bind(purchase_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(purchase_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%purchase_id, "purchase deleted");
        Ok(())
    }
}
