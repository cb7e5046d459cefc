//! Delivery endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::deliveries::{
    CreateDeliveryInput, Delivery, DeliveryListQuery, DeliveryWithDetail,
};
use crate::services::DeliveryService;
use crate::AppState;

pub async fn list_deliveries(
    State(state): State<AppState>,
    Query(query): Query<DeliveryListQuery>,
) -> AppResult<Json<ApiResponse<Vec<DeliveryWithDetail>>>> {
    let deliveries = DeliveryService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::ok(deliveries)))
}

pub async fn create_delivery(
    State(state): State<AppState>,
    Json(input): Json<CreateDeliveryInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Delivery>>)> {
    let delivery = DeliveryService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(delivery))))
}

pub async fn confirm_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    let delivery = DeliveryService::new(state.db).confirm(delivery_id).await?;
    Ok(Json(ApiResponse::ok(delivery)))
}
