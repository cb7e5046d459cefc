//! Financial dashboard endpoint

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::finance::FinanceDashboard;
use crate::services::FinanceService;
use crate::AppState;

pub async fn get_finance_dashboard(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<FinanceDashboard>>> {
    let service = FinanceService::new(state.db, state.config.business.timezone_offset_hours);
    let dashboard = service.dashboard().await?;
    Ok(Json(ApiResponse::ok(dashboard)))
}
