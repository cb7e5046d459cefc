//! Operating expense records

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    pub account_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExpenseInput {
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    pub amount: Decimal,
    pub account_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListQuery {
    pub category: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct ExpenseService {
    db: PgPool,
}

impl ExpenseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate_input(input: &ExpenseInput) -> AppResult<()> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Amount must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub async fn list(&self, query: ExpenseListQuery) -> AppResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(query.category)
        .bind(query.date_from)
        .bind(query.date_to)
        .fetch_all(&self.db)
        .await?;
        Ok(expenses)
    }

    pub async fn get(&self, expense_id: Uuid) -> AppResult<Expense> {
        sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = $1")
            .bind(expense_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense".to_string()))
    }

    pub async fn create(&self, input: ExpenseInput) -> AppResult<Expense> {
        Self::validate_input(&input)?;

        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (date, category, amount, account_id, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(input.date)
        .bind(&input.category)
        .bind(input.amount)
        .bind(input.account_id)
        .bind(&input.note)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(expense_id = %expense.id, category = %expense.category, amount = %expense.amount, "expense created");
        Ok(expense)
    }

    pub async fn update(&self, expense_id: Uuid, input: ExpenseInput) -> AppResult<Expense> {
        Self::validate_input(&input)?;

        sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
            SET date = $1, category = $2, amount = $3, account_id = $4, note = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(input.date)
        .bind(&input.category)
        .bind(input.amount)
        .bind(input.account_id)
        .bind(&input.note)
        .bind(expense_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Expense".to_string()))
    }

    pub async fn delete(&self, expense_id: Uuid) -> AppResult<()> {
        let deleted = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(expense_id)
            .execute(&self.db)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense".to_string()));
        }
        Ok(())
    }
}
