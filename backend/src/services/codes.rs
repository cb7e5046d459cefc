//! Sequential document code allocation
//!
//! Codes come from a per-kind monotonic counter bumped with an atomic
//! upsert, so concurrent allocations can never hand out the same number.

use sqlx::{Postgres, Transaction};

use crate::error::AppResult;
use shared::reconcile::format_doc_code;

/// Allocate the next code for a document kind, e.g. `R000042`.
pub async fn next_document_code(
    tx: &mut Transaction<'_, Postgres>,
    kind: &str,
    prefix: &str,
) -> AppResult<String> {
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO doc_sequences (kind, last_value)
        VALUES ($1, 1)
        ON CONFLICT (kind) DO UPDATE SET last_value = doc_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(kind)
    .fetch_one(&mut **tx)
    .await?;

    Ok(format_doc_code(prefix, sequence))
}
