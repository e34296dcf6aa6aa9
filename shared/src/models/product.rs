//! Product master data

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product stocked by the pharmacy
///
/// `total_stock` is the denormalized aggregate over the product's batches
/// and always equals the sum of their quantities. Expired stock stays in
/// the aggregate even though it is no longer sellable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    /// Reorder threshold for low-stock reporting
    pub alert_quantity: i32,
    pub reference_buy_price: Decimal,
    pub reference_sell_price: Decimal,
    pub total_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.total_stock < self.alert_quantity
    }
}
