//! HTTP handlers for stock reporting endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{AvailableStock, BatchDetail, ExpiringBatch, StockOverview, StockService};
use crate::AppState;

const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

/// Query for expiring-batch lookups
#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

/// Sellable stock for one product
pub async fn available_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<AvailableStock>> {
    let service = StockService::new(state.db);
    let stock = service.available_stock(product_id).await?;
    Ok(Json(stock))
}

/// One batch with its product name and sellability
pub async fn batch_detail(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchDetail>> {
    let service = StockService::new(state.db);
    let detail = service.batch_detail(batch_id).await?;
    Ok(Json(detail))
}

/// Whole-inventory snapshot
pub async fn stock_overview(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<StockOverview>> {
    let service = StockService::new(state.db);
    let overview = service.stock_overview().await?;
    Ok(Json(overview))
}

/// Stocked batches expiring within the requested window
pub async fn expiring_batches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<ExpiringBatch>>> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    let service = StockService::new(state.db);
    let batches = service.expiring_batches(days).await?;
    Ok(Json(batches))
}
