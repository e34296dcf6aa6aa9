//! Financial aggregation service
//!
//! Daily settlement folds the day's documents into one aggregate row:
//! sales revenue and cost of goods, return amounts, and stocktake gain
//! and loss. Settlement recomputes from the document log and upserts, so
//! replaying a day after a correction overwrites rather than accumulates.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::DailyAggregate;
use shared::types::DateRange;
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

/// Finance service
#[derive(Clone)]
pub struct FinanceService {
    db: PgPool,
}

/// Revenue and cost for one day's sales
#[derive(Debug, FromRow)]
struct SalesTotals {
    revenue: Decimal,
    cost: Decimal,
}

/// Monthly rollup of settled days
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlySummary {
    pub month: i32,
    pub sales_revenue: Decimal,
    pub sales_profit: Decimal,
    pub sales_return_amount: Decimal,
    pub purchase_return_amount: Decimal,
    pub stocktake_loss: Decimal,
    pub stocktake_gain: Decimal,
    pub net_amount: Decimal,
    pub days_settled: i64,
}

/// Annual rollup of settled days
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnnualSummary {
    pub sales_revenue: Decimal,
    pub sales_profit: Decimal,
    pub sales_return_amount: Decimal,
    pub purchase_return_amount: Decimal,
    pub stocktake_loss: Decimal,
    pub stocktake_gain: Decimal,
    pub net_amount: Decimal,
    pub days_settled: i64,
}

/// Daily aggregate row as stored
#[derive(Debug, FromRow)]
struct AggregateRow {
    day: NaiveDate,
    sales_revenue: Decimal,
    sales_cost: Decimal,
    sales_profit: Decimal,
    sales_return_amount: Decimal,
    purchase_return_amount: Decimal,
    stocktake_loss: Decimal,
    stocktake_gain: Decimal,
    net_amount: Decimal,
    settled_at: chrono::DateTime<chrono::Utc>,
}

impl From<AggregateRow> for DailyAggregate {
    fn from(row: AggregateRow) -> Self {
        DailyAggregate {
            day: row.day,
            sales_revenue: row.sales_revenue,
            sales_cost: row.sales_cost,
            sales_profit: row.sales_profit,
            sales_return_amount: row.sales_return_amount,
            purchase_return_amount: row.purchase_return_amount,
            stocktake_loss: row.stocktake_loss,
            stocktake_gain: row.stocktake_gain,
            net_amount: row.net_amount,
            settled_at: row.settled_at,
        }
    }
}

impl FinanceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Settle one day, recomputing its aggregate row from the document log
    ///
    /// Revenue counts every sales order issued that day; reversals show up
    /// as return amounts rather than removing the original revenue, so the
    /// day's history stays visible.
    pub async fn settle_day(&self, day: NaiveDate) -> AppResult<DailyAggregate> {
        let mut dbtx = self.db.begin().await?;

        let sales = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT
                COALESCE(SUM(sl.subtotal), 0) AS revenue,
                COALESCE(SUM(sl.quantity * p.reference_buy_price), 0) AS cost
            FROM sales_lines sl
            JOIN sales_orders so ON so.id = sl.order_id
            JOIN products p ON p.id = sl.product_id
            WHERE so.effective_date = $1
            "#,
        )
        .bind(day)
        .fetch_one(&mut *dbtx)
        .await?;

        let sales_return_amount: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM sales_returns WHERE effective_date = $1",
        )
        .bind(day)
        .fetch_one(&mut *dbtx)
        .await?;

        let purchase_return_amount: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM purchase_returns WHERE effective_date = $1",
        )
        .bind(day)
        .fetch_one(&mut *dbtx)
        .await?;

        let stocktake_loss: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(-amount_diff), 0) FROM stocktakes WHERE effective_date = $1 AND amount_diff < 0",
        )
        .bind(day)
        .fetch_one(&mut *dbtx)
        .await?;

        let stocktake_gain: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_diff), 0) FROM stocktakes WHERE effective_date = $1 AND amount_diff > 0",
        )
        .bind(day)
        .fetch_one(&mut *dbtx)
        .await?;

        let sales_profit = sales.revenue - sales.cost;
        let net_amount = DailyAggregate::compute_net(
            sales_profit,
            sales_return_amount,
            purchase_return_amount,
            stocktake_loss,
            stocktake_gain,
        );

        let row = sqlx::query_as::<_, AggregateRow>(
            r#"
            INSERT INTO daily_aggregates
                (day, sales_revenue, sales_cost, sales_profit, sales_return_amount,
                 purchase_return_amount, stocktake_loss, stocktake_gain, net_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (day) DO UPDATE SET
                sales_revenue = EXCLUDED.sales_revenue,
                sales_cost = EXCLUDED.sales_cost,
                sales_profit = EXCLUDED.sales_profit,
                sales_return_amount = EXCLUDED.sales_return_amount,
                purchase_return_amount = EXCLUDED.purchase_return_amount,
                stocktake_loss = EXCLUDED.stocktake_loss,
                stocktake_gain = EXCLUDED.stocktake_gain,
                net_amount = EXCLUDED.net_amount,
                settled_at = NOW()
            RETURNING day, sales_revenue, sales_cost, sales_profit, sales_return_amount,
                      purchase_return_amount, stocktake_loss, stocktake_gain, net_amount, settled_at
            "#,
        )
        .bind(day)
        .bind(sales.revenue)
        .bind(sales.cost)
        .bind(sales_profit)
        .bind(sales_return_amount)
        .bind(purchase_return_amount)
        .bind(stocktake_loss)
        .bind(stocktake_gain)
        .bind(net_amount)
        .fetch_one(&mut *dbtx)
        .await?;

        dbtx.commit().await?;

        tracing::info!("Settled {}: revenue {}, net {}", day, sales.revenue, net_amount);
        Ok(row.into())
    }

    /// Settled rows for an inclusive date range, newest first
    pub async fn daily_range(&self, range: DateRange) -> AppResult<Vec<DailyAggregate>> {
        let rows = sqlx::query_as::<_, AggregateRow>(
            r#"
            SELECT day, sales_revenue, sales_cost, sales_profit, sales_return_amount,
                   purchase_return_amount, stocktake_loss, stocktake_gain, net_amount, settled_at
            FROM daily_aggregates
            WHERE day BETWEEN $1 AND $2
            ORDER BY day DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Per-month totals over the settled days of one year
    pub async fn monthly_summary(&self, year: i32) -> AppResult<Vec<MonthlySummary>> {
        let (start, end) = year_bounds(year)?;

        let rows = sqlx::query_as::<_, MonthlySummary>(
            r#"
            SELECT
                EXTRACT(MONTH FROM day)::INT AS month,
                SUM(sales_revenue) AS sales_revenue,
                SUM(sales_profit) AS sales_profit,
                SUM(sales_return_amount) AS sales_return_amount,
                SUM(purchase_return_amount) AS purchase_return_amount,
                SUM(stocktake_loss) AS stocktake_loss,
                SUM(stocktake_gain) AS stocktake_gain,
                SUM(net_amount) AS net_amount,
                COUNT(*) AS days_settled
            FROM daily_aggregates
            WHERE day BETWEEN $1 AND $2
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Whole-year totals over the settled days of one year
    pub async fn annual_summary(&self, year: i32) -> AppResult<AnnualSummary> {
        let (start, end) = year_bounds(year)?;

        let summary = sqlx::query_as::<_, AnnualSummary>(
            r#"
            SELECT
                COALESCE(SUM(sales_revenue), 0) AS sales_revenue,
                COALESCE(SUM(sales_profit), 0) AS sales_profit,
                COALESCE(SUM(sales_return_amount), 0) AS sales_return_amount,
                COALESCE(SUM(purchase_return_amount), 0) AS purchase_return_amount,
                COALESCE(SUM(stocktake_loss), 0) AS stocktake_loss,
                COALESCE(SUM(stocktake_gain), 0) AS stocktake_gain,
                COALESCE(SUM(net_amount), 0) AS net_amount,
                COUNT(*) AS days_settled
            FROM daily_aggregates
            WHERE day BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }
}

fn year_bounds(year: i32) -> AppResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::Validation {
            field: "year".to_string(),
            message: "Year is out of range".to_string(),
        }),
    }
}
