//! Return models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A return of previously sold stock back into a batch
///
/// The returned quantity is capped at what the original order drew from
/// that batch, less any earlier returns against the same pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReturn {
    /// Generated document id, e.g. `SR202601150002`
    pub id: String,
    pub order_id: String,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A return of purchased stock back to the supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReturn {
    /// Generated document id, e.g. `PR202601150001`
    pub id: String,
    pub order_id: String,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
