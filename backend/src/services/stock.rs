//! Stock reporting service
//!
//! Read-only views over the batch ledger: sellable stock per product for
//! order entry, an inventory overview with expiry buckets and low-stock
//! products, and expiring-batch lookups. Sellable means quantity above
//! zero and expiry strictly after today, so stock expiring today is
//! already excluded.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::Batch;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stock reporting service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// One sellable batch with its remaining shelf life
#[derive(Debug, Clone, Serialize)]
pub struct AvailableBatch {
    pub batch_id: Uuid,
    pub lot_label: String,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
    pub days_to_expiry: i64,
}

/// Sellable stock for one product, batches in draw order
#[derive(Debug, Clone, Serialize)]
pub struct AvailableStock {
    pub product_id: Uuid,
    pub product_name: String,
    pub reference_sell_price: Decimal,
    pub total_available: i64,
    pub batches: Vec<AvailableBatch>,
}

/// Whole-inventory snapshot
#[derive(Debug, Clone, Serialize)]
pub struct StockOverview {
    pub product_count: i64,
    pub batch_count: i64,
    /// Stock on hand valued at reference buy prices
    pub total_value: Decimal,
    pub expired_batches: i64,
    pub expiring_30_days: i64,
    pub expiring_90_days: i64,
    pub expiring_180_days: i64,
    pub low_stock_products: Vec<LowStockProduct>,
}

/// A product whose aggregate stock fell under its reorder threshold
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockProduct {
    pub product_id: Uuid,
    pub name: String,
    pub total_stock: i32,
    pub alert_quantity: i32,
}

/// A stocked batch approaching expiry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpiringBatch {
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub lot_label: String,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
}

/// One batch with its product name and sellability as of today
#[derive(Debug, Clone, Serialize)]
pub struct BatchDetail {
    pub batch: Batch,
    pub product_name: String,
    pub sellable: bool,
}

#[derive(Debug, FromRow)]
struct BatchDetailRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    lot_label: String,
    expiry_date: NaiveDate,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ProductHeader {
    name: String,
    reference_sell_price: Decimal,
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    lot_label: String,
    expiry_date: NaiveDate,
    quantity: i32,
}

#[derive(Debug, FromRow)]
struct OverviewCounts {
    product_count: i64,
    batch_count: i64,
    total_value: Decimal,
}

#[derive(Debug, FromRow)]
struct ExpiryBuckets {
    expired: i64,
    within_30: i64,
    within_90: i64,
    within_180: i64,
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// One batch with its product name and current sellability
    pub async fn batch_detail(&self, batch_id: Uuid) -> AppResult<BatchDetail> {
        let today = Utc::now().date_naive();

        let row = sqlx::query_as::<_, BatchDetailRow>(
            r#"
            SELECT b.id, b.product_id, p.name AS product_name,
                   b.lot_label, b.expiry_date, b.quantity, b.created_at, b.updated_at
            FROM batches b
            JOIN products p ON p.id = b.product_id
            WHERE b.id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        let batch = Batch {
            id: row.id,
            product_id: row.product_id,
            lot_label: row.lot_label,
            expiry_date: row.expiry_date,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        let sellable = batch.is_sellable(today);

        Ok(BatchDetail {
            batch,
            product_name: row.product_name,
            sellable,
        })
    }

    /// Sellable stock for one product, batches ordered first-expiry-first
    pub async fn available_stock(&self, product_id: Uuid) -> AppResult<AvailableStock> {
        let today = Utc::now().date_naive();

        let product = sqlx::query_as::<_, ProductHeader>(
            "SELECT name, reference_sell_price FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, lot_label, expiry_date, quantity
            FROM batches
            WHERE product_id = $1 AND quantity > 0 AND expiry_date > $2
            ORDER BY expiry_date ASC, id ASC
            "#,
        )
        .bind(product_id)
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        let total_available = rows.iter().map(|b| i64::from(b.quantity)).sum();
        let batches = rows
            .into_iter()
            .map(|b| AvailableBatch {
                batch_id: b.id,
                lot_label: b.lot_label,
                days_to_expiry: (b.expiry_date - today).num_days(),
                expiry_date: b.expiry_date,
                quantity: b.quantity,
            })
            .collect();

        Ok(AvailableStock {
            product_id,
            product_name: product.name,
            reference_sell_price: product.reference_sell_price,
            total_available,
            batches,
        })
    }

    /// Inventory snapshot: counts, valuation, expiry buckets, low stock
    ///
    /// Buckets count stocked batches only and do not overlap: a batch 20
    /// days out appears in the 30-day bucket but not the 90-day one.
    pub async fn stock_overview(&self) -> AppResult<StockOverview> {
        let today = Utc::now().date_naive();

        let counts = sqlx::query_as::<_, OverviewCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS product_count,
                (SELECT COUNT(*) FROM batches WHERE quantity > 0) AS batch_count,
                (SELECT COALESCE(SUM(b.quantity * p.reference_buy_price), 0)
                 FROM batches b JOIN products p ON p.id = b.product_id
                 WHERE b.quantity > 0) AS total_value
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let buckets = sqlx::query_as::<_, ExpiryBuckets>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE expiry_date <= $1) AS expired,
                COUNT(*) FILTER (WHERE expiry_date > $1 AND expiry_date <= $1 + 30) AS within_30,
                COUNT(*) FILTER (WHERE expiry_date > $1 + 30 AND expiry_date <= $1 + 90) AS within_90,
                COUNT(*) FILTER (WHERE expiry_date > $1 + 90 AND expiry_date <= $1 + 180) AS within_180
            FROM batches
            WHERE quantity > 0
            "#,
        )
        .bind(today)
        .fetch_one(&self.db)
        .await?;

        let low_stock_products = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT id AS product_id, name, total_stock, alert_quantity
            FROM products
            WHERE total_stock < alert_quantity
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(StockOverview {
            product_count: counts.product_count,
            batch_count: counts.batch_count,
            total_value: counts.total_value,
            expired_batches: buckets.expired,
            expiring_30_days: buckets.within_30,
            expiring_90_days: buckets.within_90,
            expiring_180_days: buckets.within_180,
            low_stock_products,
        })
    }

    /// Stocked batches expiring within the given number of days
    ///
    /// Includes already expired batches so the report surfaces stock that
    /// needs disposal, not only stock about to need it.
    pub async fn expiring_batches(&self, within_days: i64) -> AppResult<Vec<ExpiringBatch>> {
        let today = Utc::now().date_naive();

        let batches = sqlx::query_as::<_, ExpiringBatch>(
            r#"
            SELECT b.id AS batch_id, b.product_id, p.name AS product_name,
                   b.lot_label, b.expiry_date, b.quantity
            FROM batches b
            JOIN products p ON p.id = b.product_id
            WHERE b.quantity > 0 AND b.expiry_date <= $1 + $2::INT
            ORDER BY b.expiry_date ASC, b.lot_label ASC
            "#,
        )
        .bind(today)
        .bind(within_days as i32)
        .fetch_all(&self.db)
        .await?;

        Ok(batches)
    }
}
