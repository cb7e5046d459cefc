//! Accounts receivable endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::ledger::{ArEntry, ArListQuery};
use crate::services::LedgerService;
use crate::AppState;

pub async fn list_ar(
    State(state): State<AppState>,
    Query(query): Query<ArListQuery>,
) -> AppResult<Json<ApiResponse<Vec<ArEntry>>>> {
    let entries = LedgerService::new(state.db).list_ar(query).await?;
    Ok(Json(ApiResponse::ok(entries)))
}
