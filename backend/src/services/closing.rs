//! Business day closing
//!
//! A closing is an append-only checkpoint over confirmed sales of one
//! source channel. The window starts at the previous checkpoint, or at
//! midnight in the reference timezone for the first closing of a day.
//! An advisory lock per source keeps concurrent closings from double
//! counting the same window.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use shared::models::{ClosingStats, SaleSummary};
use shared::reconcile::{reference_midnight, tally_closing_stats};
use shared::types::ClosingSource;

#[derive(Debug, Serialize, FromRow)]
pub struct ClosingRecord {
    pub id: Uuid,
    pub source: String,
    pub closing_time: DateTime<Utc>,
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
    pub sales_by_account: Json<BTreeMap<Uuid, Decimal>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClosingPreview {
    /// Start of the window being tallied
    pub since: DateTime<Utc>,
    pub last_closing_time: Option<DateTime<Utc>>,
    pub current_stats: ClosingStats,
}

#[derive(Debug, Deserialize)]
pub struct CloseDayInput {
    pub source: String,
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct DayClosingService {
    db: PgPool,
    timezone_offset_hours: i32,
}

impl DayClosingService {
    pub fn new(db: PgPool, timezone_offset_hours: i32) -> Self {
        Self {
            db,
            timezone_offset_hours,
        }
    }

    /// Tally the open window without writing a checkpoint.
    pub async fn preview(&self, source: ClosingSource) -> AppResult<ClosingPreview> {
        let mut tx = self.db.begin().await?;
        let last = last_closing_time(&mut tx, source).await?;
        let since = last.unwrap_or_else(|| reference_midnight(Utc::now(), self.timezone_offset_hours));
        let sales = window_sales(&mut tx, source, since).await?;
        tx.commit().await?;

        Ok(ClosingPreview {
            since,
            last_closing_time: last,
            current_stats: tally_closing_stats(&sales),
        })
    }

    /// Close the open window, persisting a checkpoint that becomes the
    /// start of the next one.
    pub async fn close(&self, source: ClosingSource, note: Option<String>) -> AppResult<ClosingRecord> {
        let mut tx = self.db.begin().await?;

        // Serialize closings per source for the duration of the transaction
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(format!("business_day_closing:{}", source.as_str()))
            .execute(&mut *tx)
            .await?;

        let last = last_closing_time(&mut tx, source).await?;
        let since = last.unwrap_or_else(|| reference_midnight(Utc::now(), self.timezone_offset_hours));
        let sales = window_sales(&mut tx, source, since).await?;
        let stats = tally_closing_stats(&sales);

        let record = sqlx::query_as::<_, ClosingRecord>(
            r#"
            INSERT INTO business_day_closings (
                source, closing_time, sales_count,
                total_sales, total_cash, total_card, total_transfer, total_cod,
                paid_count, paid_sales, paid_cash, paid_card, paid_transfer, paid_cod,
                unpaid_count, unpaid_sales, sales_by_account, note
            )
            VALUES ($1, now(), $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(source.as_str())
        .bind(stats.sales_count)
        .bind(stats.total_sales)
        .bind(stats.total_cash)
        .bind(stats.total_card)
        .bind(stats.total_transfer)
        .bind(stats.total_cod)
        .bind(stats.paid_count)
        .bind(stats.paid_sales)
        .bind(stats.paid_cash)
        .bind(stats.paid_card)
        .bind(stats.paid_transfer)
        .bind(stats.paid_cod)
        .bind(stats.unpaid_count)
        .bind(stats.unpaid_sales)
        .bind(Json(&stats.sales_by_account))
        .bind(&note)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            source = source.as_str(),
            %since,
            sales_count = stats.sales_count,
            total_sales = %stats.total_sales,
            "business day closed"
        );
        Ok(record)
    }
}

async fn last_closing_time(
    tx: &mut Transaction<'_, Postgres>,
    source: ClosingSource,
) -> AppResult<Option<DateTime<Utc>>> {
    let last = sqlx::query_scalar::<_, DateTime<Utc>>(
        r#"
        SELECT closing_time FROM business_day_closings
        WHERE source = $1
        ORDER BY closing_time DESC
        LIMIT 1
        "#,
    )
    .bind(source.as_str())
    .fetch_optional(&mut **tx)
    .await?;
    Ok(last)
}

/// Confirmed sales of the window, zero-amount sales included.
async fn window_sales(
    tx: &mut Transaction<'_, Postgres>,
    source: ClosingSource,
    since: DateTime<Utc>,
) -> AppResult<Vec<SaleSummary>> {
    let rows = sqlx::query_as::<_, (Decimal, String, Option<Uuid>, bool)>(
        r#"
        SELECT total, payment_method, account_id, is_paid
        FROM sales
        WHERE source = $1 AND status = 'confirmed' AND created_at >= $2
        "#,
    )
    .bind(source.as_str())
    .bind(since)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(total, payment_method, account_id, is_paid)| SaleSummary {
            total,
            payment_method,
            account_id,
            is_paid,
        })
        .collect())
}
