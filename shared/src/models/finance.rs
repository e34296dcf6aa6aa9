//! Financial aggregation models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One settled day of financial activity
///
/// Derived state, rebuilt by settlement from the order, return, and
/// stocktake log for the day. Re-settling a day overwrites its row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub day: NaiveDate,
    pub sales_revenue: Decimal,
    /// Cost of goods at reference buy prices
    pub sales_cost: Decimal,
    pub sales_profit: Decimal,
    pub sales_return_amount: Decimal,
    pub purchase_return_amount: Decimal,
    pub stocktake_loss: Decimal,
    pub stocktake_gain: Decimal,
    pub net_amount: Decimal,
    pub settled_at: DateTime<Utc>,
}

impl DailyAggregate {
    /// Net effect for the day:
    /// profit less sales returns, plus purchase returns, less stocktake
    /// loss, plus stocktake gain.
    pub fn compute_net(
        sales_profit: Decimal,
        sales_return_amount: Decimal,
        purchase_return_amount: Decimal,
        stocktake_loss: Decimal,
        stocktake_gain: Decimal,
    ) -> Decimal {
        sales_profit - sales_return_amount + purchase_return_amount - stocktake_loss
            + stocktake_gain
    }
}
