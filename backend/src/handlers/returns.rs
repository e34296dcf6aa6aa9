//! HTTP handlers for return endpoints

use axum::{extract::State, Json};

use shared::models::{PurchaseReturn, SalesReturn};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::returns::{ReturnLineInput, ReturnsService};
use crate::AppState;

/// Return part of a sales order's draw from one batch
pub async fn create_sales_return(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReturnLineInput>,
) -> AppResult<Json<SalesReturn>> {
    let service = ReturnsService::new(state.db);
    let result = service
        .return_sale_line(current_user.0.user_id, input)
        .await?;
    Ok(Json(result))
}

/// Return part of a purchase order's credit to the supplier
pub async fn create_purchase_return(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReturnLineInput>,
) -> AppResult<Json<PurchaseReturn>> {
    let service = ReturnsService::new(state.db);
    let result = service
        .return_purchase_line(current_user.0.user_id, input)
        .await?;
    Ok(Json(result))
}
