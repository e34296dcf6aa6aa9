//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::purchase::{CreatePurchaseInput, PurchaseDetail, PurchaseService};
use crate::services::sales::OrderResult;
use crate::AppState;

/// Create a purchase order, receiving stock into batches
pub async fn create_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePurchaseInput>,
) -> AppResult<Json<OrderResult>> {
    let service = PurchaseService::new(state.db);
    let order = service
        .create_purchase(current_user.0.user_id, input)
        .await?;
    Ok(Json(order))
}

/// Fetch a purchase order with its lines
pub async fn get_purchase(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<PurchaseDetail>> {
    let service = PurchaseService::new(state.db);
    let detail = service.get_purchase(&order_id).await?;
    Ok(Json(detail))
}

/// Cancel a purchase order, reversing its credited stock
pub async fn cancel_purchase(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<()>> {
    let service = PurchaseService::new(state.db);
    service.cancel_purchase(&order_id).await?;
    Ok(Json(()))
}
