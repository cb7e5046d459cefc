//! Purchase and receiving endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::purchases::PurchaseDetail;
use crate::services::receiving::ReceiveOutcome;
use crate::services::{PurchaseService, ReceivingService};
use crate::AppState;

pub async fn get_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PurchaseDetail>>> {
    let purchase = PurchaseService::new(state.db).get(purchase_id).await?;
    Ok(Json(ApiResponse::ok(purchase)))
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    PurchaseService::new(state.db).delete(purchase_id).await?;
    Ok(Json(ApiResponse::empty()))
}

#[derive(Debug, Deserialize)]
pub struct ReceiveInput {
    pub quantity: i32,
}

pub async fn receive_purchase_item(
    State(state): State<AppState>,
    Path(purchase_item_id): Path<Uuid>,
    Json(input): Json<ReceiveInput>,
) -> AppResult<Json<ApiResponse<ReceiveOutcome>>> {
    let outcome = ReceivingService::new(state.db)
        .receive_line(purchase_item_id, input.quantity)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
