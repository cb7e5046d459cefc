//! Purchase receiving workflow
//!
//! Receiving a purchase line books the goods into stock, appends the line
//! to the day's receiving batch and rolls the parent purchase's receiving
//! status up from its line items.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{codes, inventory};
use shared::models::ReceivingProgress;
use shared::reconcile::{derive_receiving_status, validate_receive_quantity, ReceiveQuantityError};
use shared::types::ReceivingStatus;

#[derive(Debug, FromRow)]
struct PurchaseLineRow {
    id: Uuid,
    purchase_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    received_quantity: i32,
    cost: Decimal,
    purchase_no: String,
}

/// Result of booking one receipt against a purchase line
#[derive(Debug, Serialize)]
pub struct ReceiveOutcome {
    pub receiving_id: Uuid,
    pub receiving_no: String,
    pub purchase_item_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub received_quantity: i32,
    pub is_received: bool,
    pub receiving_status: ReceivingStatus,
    pub stock: i32,
}

#[derive(Clone)]
pub struct ReceivingService {
    db: PgPool,
}

impl ReceivingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Book `quantity` units received against a purchase line.
    ///
    /// All writes happen in one transaction: the receiving batch and line,
    /// the purchase line progress, the stock delta with its weighted-average
    /// cost update and the purchase's rolled-up receiving status.
    pub async fn receive_line(
        &self,
        purchase_item_id: Uuid,
        quantity: i32,
    ) -> AppResult<ReceiveOutcome> {
        let mut tx = self.db.begin().await?;

        // Locking the parent purchase serializes receipts against sibling
        // lines; without it two concurrent receipts could each open a day
        // batch for the same purchase
        let line = sqlx::query_as::<_, PurchaseLineRow>(
            r#"
            SELECT pi.id, pi.purchase_id, pi.product_id, pi.quantity,
                   pi.received_quantity, pi.cost, p.purchase_no
            FROM purchase_items pi
            JOIN purchases p ON p.id = pi.purchase_id
            WHERE pi.id = $1
            FOR UPDATE OF pi, p
            "#,
        )
        .bind(purchase_item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase item".to_string()))?;

        validate_receive_quantity(line.quantity, line.received_quantity, quantity).map_err(
            |e| match e {
                ReceiveQuantityError::NotPositive => {
                    AppError::ValidationError("Receive quantity must be greater than 0".to_string())
                }
                ReceiveQuantityError::ExceedsRemaining { remaining } => {
                    AppError::ValidationError(format!(
                        "Receive quantity exceeds remaining quantity: remaining {}, attempted {}",
                        remaining, quantity
                    ))
                }
            },
        )?;

        // Reuse today's batch for this purchase or open a new one
        let batch = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT id, receiving_no FROM purchase_receivings
            WHERE purchase_id = $1 AND receiving_date::date = CURRENT_DATE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(line.purchase_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (receiving_id, receiving_no) = match batch {
            Some(existing) => existing,
            None => {
                let receiving_no = codes::next_document_code(&mut tx, "purchase_receiving", "R").await?;
                let id: Uuid = sqlx::query_scalar(
                    r#"
                    INSERT INTO purchase_receivings (receiving_no, purchase_id, note)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    "#,
                )
                .bind(&receiving_no)
                .bind(line.purchase_id)
                .bind(format!("Receiving for purchase {}", line.purchase_no))
                .fetch_one(&mut *tx)
                .await?;
                (id, receiving_no)
            }
        };

        let receiving_item_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_receiving_items (receiving_id, purchase_item_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(receiving_id)
        .bind(line.id)
        .bind(line.product_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        let (received_quantity, is_received) = sqlx::query_as::<_, (i32, bool)>(
            r#"
            UPDATE purchase_items
            SET received_quantity = received_quantity + $1,
                is_received = received_quantity + $1 >= quantity
            WHERE id = $2
            RETURNING received_quantity, is_received
            "#,
        )
        .bind(quantity)
        .bind(line.id)
        .fetch_one(&mut *tx)
        .await?;

        // Each receiving line is its own inventory event
        let stock = inventory::apply_delta(
            &mut tx,
            &inventory::StockDelta {
                product_id: line.product_id,
                qty_change: quantity,
                unit_cost: Some(line.cost),
                ref_type: "purchase_receiving",
                ref_id: receiving_item_id,
                memo: format!("Receiving {} for purchase {}", receiving_no, line.purchase_no),
            },
        )
        .await?
        .ok_or_else(|| {
            AppError::DuplicateEntry("Inventory log for receiving line".to_string())
        })?;

        let progress: Vec<ReceivingProgress> = sqlx::query_as::<_, (i32, bool)>(
            "SELECT received_quantity, is_received FROM purchase_items WHERE purchase_id = $1",
        )
        .bind(line.purchase_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(received_quantity, is_received)| ReceivingProgress {
            received_quantity,
            is_received,
        })
        .collect();

        let receiving_status = derive_receiving_status(&progress);

        sqlx::query("UPDATE purchases SET receiving_status = $1, updated_at = now() WHERE id = $2")
            .bind(receiving_status.as_str())
            .bind(line.purchase_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_item_id = %line.id,
            %receiving_no,
            quantity,
            status = receiving_status.as_str(),
            "purchase line received"
        );

        Ok(ReceiveOutcome {
            receiving_id,
            receiving_no,
            purchase_item_id: line.id,
            product_id: line.product_id,
            quantity,
            received_quantity,
            is_received,
            receiving_status,
            stock,
        })
    }
}
