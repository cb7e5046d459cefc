//! Delivery creation and confirmation
//!
//! Stock leaves inventory at delivery confirmation, not at sale time.
//! Confirmation is idempotent: the per-item inventory log keyed by the
//! delivery id makes a re-confirm skip items already debited.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{codes, inventory};
use shared::reconcile::plan_delivery_debits;
use shared::types::DocumentStatus;

#[derive(Debug, Serialize, FromRow)]
pub struct Delivery {
    pub id: Uuid,
    pub delivery_no: String,
    pub sale_id: Uuid,
    pub status: String,
    pub delivery_date: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DeliveryItemDetail {
    pub id: Uuid,
    pub delivery_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub item_code: String,
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DeliverySaleRef {
    pub sale_no: String,
    pub customer_code: Option<String>,
    pub total: Decimal,
    pub is_paid: bool,
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryWithDetail {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub sale: DeliverySaleRef,
    pub items: Vec<DeliveryItemDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryListQuery {
    pub status: Option<String>,
    pub sale_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeliveryInput {
    pub sale_id: Uuid,
    pub items: Vec<DeliveryItemInput>,
    pub method: Option<String>,
    pub note: Option<String>,
    /// Confirm immediately after creation, debiting stock in the same
    /// transaction
    #[serde(default)]
    pub auto_confirm: bool,
}

#[derive(FromRow)]
struct DeliveryListRow {
    id: Uuid,
    delivery_no: String,
    sale_id: Uuid,
    status: String,
    delivery_date: Option<DateTime<Utc>>,
    method: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    sale_no: String,
    customer_code: Option<String>,
    sale_total: Decimal,
    is_paid: bool,
    customer_name: Option<String>,
}

#[derive(Clone)]
pub struct DeliveryService {
    db: PgPool,
}

impl DeliveryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: DeliveryListQuery) -> AppResult<Vec<DeliveryWithDetail>> {
        let rows = sqlx::query_as::<_, DeliveryListRow>(
            r#"
            SELECT d.id, d.delivery_no, d.sale_id, d.status, d.delivery_date,
                   d.method, d.note, d.created_at,
                   s.sale_no, s.customer_code, s.total AS sale_total, s.is_paid,
                   c.customer_name
            FROM deliveries d
            JOIN sales s ON s.id = d.sale_id
            LEFT JOIN customers c ON c.customer_code = s.customer_code
            WHERE ($1::text IS NULL OR d.status = $1)
              AND ($2::uuid IS NULL OR d.sale_id = $2)
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(query.status)
        .bind(query.sale_id)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, DeliveryItemDetail>(
            r#"
            SELECT di.id, di.delivery_id, di.product_id, di.quantity,
                   p.item_code, p.name, p.unit
            FROM delivery_items di
            JOIN products p ON p.id = di.product_id
            WHERE di.delivery_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_delivery: HashMap<Uuid, Vec<DeliveryItemDetail>> = HashMap::new();
        for item in items {
            by_delivery.entry(item.delivery_id).or_default().push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_delivery.remove(&row.id).unwrap_or_default();
                DeliveryWithDetail {
                    delivery: Delivery {
                        id: row.id,
                        delivery_no: row.delivery_no,
                        sale_id: row.sale_id,
                        status: row.status,
                        delivery_date: row.delivery_date,
                        method: row.method,
                        note: row.note,
                        created_at: row.created_at,
                    },
                    sale: DeliverySaleRef {
                        sale_no: row.sale_no,
                        customer_code: row.customer_code,
                        total: row.sale_total,
                        is_paid: row.is_paid,
                        customer_name: row.customer_name,
                    },
                    items,
                }
            })
            .collect())
    }

    pub async fn create(&self, input: CreateDeliveryInput) -> AppResult<Delivery> {
        if input.items.is_empty() {
            return Err(AppError::ValidationError(
                "At least one delivery item is required".to_string(),
            ));
        }
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Delivery quantity must be greater than 0".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        let sale_exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM sales WHERE id = $1")
            .bind(input.sale_id)
            .fetch_optional(&mut *tx)
            .await?;
        if sale_exists.is_none() {
            return Err(AppError::NotFound("Sale".to_string()));
        }

        let delivery_no = codes::next_document_code(&mut tx, "delivery", "D").await?;

        let delivery = sqlx::query_as::<_, Delivery>(
            r#"
            INSERT INTO deliveries (delivery_no, sale_id, status, delivery_date, method, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, delivery_no, sale_id, status, delivery_date, method, note, created_at
            "#,
        )
        .bind(&delivery_no)
        .bind(input.sale_id)
        .bind(if input.auto_confirm {
            DocumentStatus::Confirmed.as_str()
        } else {
            DocumentStatus::Draft.as_str()
        })
        .bind(input.auto_confirm.then(Utc::now))
        .bind(&input.method)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                "INSERT INTO delivery_items (delivery_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(delivery.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        if input.auto_confirm {
            let items: Vec<(Uuid, i32)> = input
                .items
                .iter()
                .map(|i| (i.product_id, i.quantity))
                .collect();
            debit_stock(&mut tx, delivery.id, &delivery_no, &items).await?;
            mark_sale_fulfilled(&mut tx, input.sale_id).await?;
        }

        tx.commit().await?;

        tracing::info!(%delivery_no, sale_id = %input.sale_id, auto_confirm = input.auto_confirm, "delivery created");
        Ok(delivery)
    }

    /// Confirm a draft delivery, debiting stock for each item.
    pub async fn confirm(&self, delivery_id: Uuid) -> AppResult<Delivery> {
        let mut tx = self.db.begin().await?;

        let (delivery_no, sale_id, status) = sqlx::query_as::<_, (String, Uuid, String)>(
            "SELECT delivery_no, sale_id, status FROM deliveries WHERE id = $1 FOR UPDATE",
        )
        .bind(delivery_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery".to_string()))?;

        if status == DocumentStatus::Cancelled.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Cancelled delivery cannot be confirmed".to_string(),
            ));
        }

        let items = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT product_id, quantity FROM delivery_items WHERE delivery_id = $1",
        )
        .bind(delivery_id)
        .fetch_all(&mut *tx)
        .await?;

        debit_stock(&mut tx, delivery_id, &delivery_no, &items).await?;

        let delivery = sqlx::query_as::<_, Delivery>(
            r#"
            UPDATE deliveries
            SET status = 'confirmed', delivery_date = COALESCE(delivery_date, now())
            WHERE id = $1
            RETURNING id, delivery_no, sale_id, status, delivery_date, method, note, created_at
            "#,
        )
        .bind(delivery_id)
        .fetch_one(&mut *tx)
        .await?;

        mark_sale_fulfilled(&mut tx, sale_id).await?;

        tx.commit().await?;

        tracing::info!(%delivery_no, "delivery confirmed");
        Ok(delivery)
    }
}

/// Debit stock for delivery items, skipping any already debited for this
/// delivery.
///
/// Lines are aggregated per product first: the inventory log admits one
/// delivery-keyed event per product, so a second line for the same product
/// must merge into that event rather than vanish against it.
async fn debit_stock(
    tx: &mut Transaction<'_, Postgres>,
    delivery_id: Uuid,
    delivery_no: &str,
    items: &[(Uuid, i32)],
) -> AppResult<()> {
    for (product_id, quantity) in plan_delivery_debits(items) {
        inventory::apply_delta(
            tx,
            &inventory::StockDelta {
                product_id,
                qty_change: -quantity,
                unit_cost: None,
                ref_type: "delivery",
                ref_id: delivery_id,
                memo: format!("Stock-out for delivery {}", delivery_no),
            },
        )
        .await?;
    }
    Ok(())
}

async fn mark_sale_fulfilled(
    tx: &mut Transaction<'_, Postgres>,
    sale_id: Uuid,
) -> AppResult<()> {
    sqlx::query("UPDATE sales SET fulfillment_status = 'completed', updated_at = now() WHERE id = $1")
        .bind(sale_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
