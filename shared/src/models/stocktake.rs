//! Stocktake adjustment models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single batch quantity correction from a physical count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeAdjustment {
    pub id: Uuid,
    pub batch_id: Uuid,
    /// Quantity on the books before the count
    pub book_quantity: i32,
    pub actual_quantity: i32,
    /// `actual - book`; negative for shrinkage
    pub quantity_diff: i32,
    /// Monetary effect at the product's reference buy price
    pub amount_diff: Decimal,
    pub remark: Option<String>,
    pub effective_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
