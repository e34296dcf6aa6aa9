//! Stocktake service
//!
//! A stocktake corrects one batch to its physically counted quantity.
//! The book quantity, the signed difference, and its monetary effect at
//! the product's reference buy price are recorded alongside the ledger
//! correction in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::StocktakeAdjustment;

use crate::error::{AppError, AppResult};
use crate::services::{ledger, tx};

/// Stocktake service
#[derive(Clone)]
pub struct StocktakeService {
    db: PgPool,
}

/// Input for recording a stocktake
#[derive(Debug, Deserialize)]
pub struct StocktakeInput {
    pub batch_id: Uuid,
    pub actual_quantity: i32,
    pub remark: Option<String>,
}

impl StocktakeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stocktake, correcting the batch to the counted quantity
    ///
    /// Zero-difference counts are recorded too; they document that the
    /// batch was checked.
    pub async fn record(&self, actor_id: Uuid, input: StocktakeInput) -> AppResult<StocktakeAdjustment> {
        if input.actual_quantity < 0 {
            return Err(AppError::Validation {
                field: "actual_quantity".to_string(),
                message: "Counted quantity cannot be negative".to_string(),
            });
        }

        for attempt in 1..=tx::MAX_TX_ATTEMPTS {
            match self.record_tx(actor_id, &input).await {
                Err(err) if tx::is_serialization_conflict(&err) => {
                    tracing::warn!("stocktake conflict on attempt {}, retrying", attempt);
                }
                other => return other,
            }
        }
        Err(AppError::Busy)
    }

    async fn record_tx(&self, actor_id: Uuid, input: &StocktakeInput) -> AppResult<StocktakeAdjustment> {
        let mut dbtx = tx::begin_serializable(&self.db).await?;
        let today = Utc::now().date_naive();

        let batch = ledger::lock_batch(&mut dbtx, input.batch_id).await?;
        let product = ledger::lock_product(&mut dbtx, batch.product_id).await?;

        let book_quantity = ledger::set_absolute(&mut dbtx, input.batch_id, input.actual_quantity).await?;
        let quantity_diff = input.actual_quantity - book_quantity;
        let amount_diff = Decimal::from(quantity_diff) * product.reference_buy_price;

        let (adjustment_id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO stocktakes (batch_id, book_quantity, actual_quantity, quantity_diff, amount_diff, remark, effective_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at
            "#,
        )
        .bind(input.batch_id)
        .bind(book_quantity)
        .bind(input.actual_quantity)
        .bind(quantity_diff)
        .bind(amount_diff)
        .bind(&input.remark)
        .bind(today)
        .bind(actor_id)
        .fetch_one(&mut *dbtx)
        .await?;

        dbtx.commit().await?;

        tracing::info!(
            "Stocktake on batch {}: {} -> {} ({:+})",
            input.batch_id,
            book_quantity,
            input.actual_quantity,
            quantity_diff
        );
        Ok(StocktakeAdjustment {
            id: adjustment_id,
            batch_id: input.batch_id,
            book_quantity,
            actual_quantity: input.actual_quantity,
            quantity_diff,
            amount_diff,
            remark: input.remark.clone(),
            effective_date: today,
            created_by: actor_id,
            created_at,
        })
    }
}
