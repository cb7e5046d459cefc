//! Business day closing endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::closing::{CloseDayInput, ClosingPreview, ClosingRecord};
use crate::services::DayClosingService;
use crate::AppState;
use shared::types::ClosingSource;

#[derive(Debug, Deserialize)]
pub struct ClosingQuery {
    pub source: Option<String>,
}

fn parse_source(raw: Option<&str>) -> AppResult<ClosingSource> {
    let raw = raw.unwrap_or("pos");
    ClosingSource::parse(raw).ok_or_else(|| {
        AppError::ValidationError(format!(
            "Invalid source '{}': must be 'pos' or 'live'",
            raw
        ))
    })
}

pub async fn get_closing_preview(
    State(state): State<AppState>,
    Query(query): Query<ClosingQuery>,
) -> AppResult<Json<ApiResponse<ClosingPreview>>> {
    let source = parse_source(query.source.as_deref())?;
    let service =
        DayClosingService::new(state.db, state.config.business.timezone_offset_hours);
    let preview = service.preview(source).await?;
    Ok(Json(ApiResponse::ok(preview)))
}

pub async fn close_business_day(
    State(state): State<AppState>,
    Json(input): Json<CloseDayInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ClosingRecord>>)> {
    let source = parse_source(Some(&input.source))?;
    let service =
        DayClosingService::new(state.db, state.config.business.timezone_offset_hours);
    let record = service.close(source, input.note).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}
