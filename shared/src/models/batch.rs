//! Batch (lot) models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discrete lot of one product, received together and expiring together
///
/// Batches are created by purchase order lines and never deleted; a batch
/// whose quantity reaches zero remains as a historical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Lot label, unique per product
    pub lot_label: String,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// A batch expiring today is already unsellable
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date <= today
    }

    pub fn is_sellable(&self, today: NaiveDate) -> bool {
        self.quantity > 0 && !self.is_expired(today)
    }
}
