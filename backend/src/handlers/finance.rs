//! HTTP handlers for financial aggregation endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::models::DailyAggregate;
use shared::types::DateRange;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::finance::{AnnualSummary, FinanceService, MonthlySummary};
use crate::AppState;

/// Body for settling a day, defaulting to today
#[derive(Debug, Deserialize, Default)]
pub struct SettleBody {
    pub day: Option<NaiveDate>,
}

/// Query for a daily aggregate range
#[derive(Debug, Deserialize)]
pub struct DailyRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Query selecting one year
#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: i32,
}

/// Settle a day's documents into its aggregate row
pub async fn settle_day(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    body: Option<Json<SettleBody>>,
) -> AppResult<Json<DailyAggregate>> {
    let day = body
        .and_then(|Json(b)| b.day)
        .unwrap_or_else(|| Utc::now().date_naive());
    let service = FinanceService::new(state.db);
    let aggregate = service.settle_day(day).await?;
    Ok(Json(aggregate))
}

/// Settled rows for an inclusive date range
pub async fn daily_aggregates(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<DailyRangeQuery>,
) -> AppResult<Json<Vec<DailyAggregate>>> {
    if query.start > query.end {
        return Err(AppError::Validation {
            field: "start".to_string(),
            message: "Range start must not be after its end".to_string(),
        });
    }
    let range = DateRange {
        start: query.start,
        end: query.end,
    };
    let service = FinanceService::new(state.db);
    let rows = service.daily_range(range).await?;
    Ok(Json(rows))
}

/// Per-month totals over the settled days of one year
pub async fn monthly_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<Vec<MonthlySummary>>> {
    let service = FinanceService::new(state.db);
    let rows = service.monthly_summary(query.year).await?;
    Ok(Json(rows))
}

/// Whole-year totals over the settled days of one year
pub async fn annual_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<AnnualSummary>> {
    let service = FinanceService::new(state.db);
    let summary = service.annual_summary(query.year).await?;
    Ok(Json(summary))
}
