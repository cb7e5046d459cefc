//! Sale endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::sales::{Sale, SaleDetail, UpdateSalePayment};
use crate::services::SaleService;
use crate::AppState;

pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SaleDetail>>> {
    let sale = SaleService::new(state.db).get(sale_id).await?;
    Ok(Json(ApiResponse::ok(sale)))
}

pub async fn update_sale_payment(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<UpdateSalePayment>,
) -> AppResult<Json<ApiResponse<Sale>>> {
    let sale = SaleService::new(state.db)
        .update_payment(sale_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(sale)))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    SaleService::new(state.db).delete(sale_id).await?;
    Ok(Json(ApiResponse::empty()))
}
