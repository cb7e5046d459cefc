//! Expense endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::expenses::{Expense, ExpenseInput, ExpenseListQuery};
use crate::services::ExpenseService;
use crate::AppState;

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpenseListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Expense>>>> {
    let expenses = ExpenseService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::ok(expenses)))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Expense>>> {
    let expense = ExpenseService::new(state.db).get(expense_id).await?;
    Ok(Json(ApiResponse::ok(expense)))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(input): Json<ExpenseInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Expense>>)> {
    let expense = ExpenseService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
    Json(input): Json<ExpenseInput>,
) -> AppResult<Json<ApiResponse<Expense>>> {
    let expense = ExpenseService::new(state.db).update(expense_id, input).await?;
    Ok(Json(ApiResponse::ok(expense)))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    ExpenseService::new(state.db).delete(expense_id).await?;
    Ok(Json(ApiResponse::empty()))
}
