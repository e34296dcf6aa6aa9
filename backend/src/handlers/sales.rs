//! HTTP handlers for sales order endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::returns::{ReverseSaleInput, ReverseSaleResult};
use crate::services::sales::{CreateSaleInput, OrderResult, SaleDetail, SalesService};
use crate::services::ReturnsService;
use crate::AppState;

/// Body for reversing a sales order
#[derive(Debug, Deserialize, Default)]
pub struct ReverseSaleBody {
    pub reason: Option<String>,
}

/// Create a sales order
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<OrderResult>> {
    let service = SalesService::new(state.db);
    let order = service.create_sale(current_user.0.user_id, input).await?;
    Ok(Json(order))
}

/// Fetch a sales order with its lines
pub async fn get_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<SaleDetail>> {
    let service = SalesService::new(state.db);
    let detail = service.get_sale(&order_id).await?;
    Ok(Json(detail))
}

/// Refund a sales order in full
pub async fn reverse_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<String>,
    body: Option<Json<ReverseSaleBody>>,
) -> AppResult<Json<ReverseSaleResult>> {
    let reason = body.and_then(|Json(b)| b.reason);
    let service = ReturnsService::new(state.db);
    let result = service
        .reverse_sale(current_user.0.user_id, ReverseSaleInput { order_id, reason })
        .await?;
    Ok(Json(result))
}
