//! Receivable ledger queries
//!
//! AR entries carry their sale and line-item context so the caller can
//! render a collectible list without further lookups.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use shared::types::{Direction, PartnerType};

#[derive(Debug, Serialize, FromRow)]
pub struct ArEntry {
    pub id: Uuid,
    pub partner_type: String,
    pub partner_code: String,
    pub direction: String,
    pub balance: Decimal,
    pub due_date: NaiveDate,
    pub status: String,
    pub ref_type: Option<String>,
    pub ref_id: Option<Uuid>,
    pub sale_item_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub sale_no: Option<String>,
    pub sale_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub item_quantity: Option<i32>,
    pub item_price: Option<Decimal>,
    pub item_subtotal: Option<Decimal>,
    pub snapshot_name: Option<String>,
    pub item_code: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArListQuery {
    pub customer_code: Option<String>,
    pub status: Option<String>,
    pub due_before: Option<NaiveDate>,
    pub keyword: Option<String>,
}

#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_ar(&self, query: ArListQuery) -> AppResult<Vec<ArEntry>> {
        let entries = sqlx::query_as::<_, ArEntry>(
            r#"
            SELECT pa.id, pa.partner_type, pa.partner_code, pa.direction, pa.balance,
                   pa.due_date, pa.status, pa.ref_type, pa.ref_id, pa.sale_item_id,
                   pa.created_at,
                   c.customer_name,
                   s.sale_no, s.sale_date, s.payment_method,
                   si.quantity AS item_quantity, si.price AS item_price,
                   si.subtotal AS item_subtotal, si.snapshot_name,
                   p.item_code, p.unit
            FROM partner_accounts pa
            LEFT JOIN customers c ON c.customer_code = pa.partner_code
            LEFT JOIN sale_items si ON si.id = pa.sale_item_id
            LEFT JOIN sales s ON s.id = COALESCE(si.sale_id, pa.ref_id)
            LEFT JOIN products p ON p.id = si.product_id
            WHERE pa.partner_type = $5 AND pa.direction = $6
              AND ($1::text IS NULL OR pa.partner_code = $1)
              AND ($2::text IS NULL OR pa.status = $2)
              AND ($3::date IS NULL OR pa.due_date <= $3)
              AND ($4::text IS NULL OR pa.partner_code ILIKE '%' || $4 || '%'
                   OR c.customer_name ILIKE '%' || $4 || '%')
            ORDER BY pa.due_date ASC, pa.created_at ASC
            "#,
        )
        .bind(query.customer_code)
        .bind(query.status)
        .bind(query.due_before)
        .bind(query.keyword)
        .bind(PartnerType::Customer.as_str())
        .bind(Direction::Ar.as_str())
        .fetch_all(&self.db)
        .await?;
        Ok(entries)
    }
}
