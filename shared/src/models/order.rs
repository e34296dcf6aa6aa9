//! Order models for sales and purchases

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a persisted order
///
/// Orders are committed on creation and flip to `Reversed` at most once,
/// on cancellation or full refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Active,
    Reversed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::Reversed => "reversed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(OrderStatus::Active),
            "reversed" => Some(OrderStatus::Reversed),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Active)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sales order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrder {
    /// Generated document id, e.g. `S202601150042`
    pub id: String,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    /// Recomputed from the persisted lines, never taken from the client
    pub total_amount: Decimal,
    pub effective_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One draw against a batch within a sales order
///
/// A single requested product line fans out into one row per batch the
/// allocation actually touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesLine {
    pub id: i64,
    pub order_id: String,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// A purchase order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Generated document id, e.g. `P202601150003`
    pub id: String,
    pub supplier_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub effective_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One batch credit within a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub id: i64,
    pub order_id: String,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}
