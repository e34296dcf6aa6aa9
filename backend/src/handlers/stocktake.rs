//! HTTP handlers for stocktake endpoints

use axum::{extract::State, Json};

use shared::models::StocktakeAdjustment;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stocktake::{StocktakeInput, StocktakeService};
use crate::AppState;

/// Record a stocktake, correcting a batch to its counted quantity
pub async fn create_stocktake(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StocktakeInput>,
) -> AppResult<Json<StocktakeAdjustment>> {
    let service = StocktakeService::new(state.db);
    let result = service.record(current_user.0.user_id, input).await?;
    Ok(Json(result))
}
