//! Batch ledger
//!
//! The only mutation path for stock. Every credit, debit, and absolute
//! correction moves the batch quantity and the owning product's
//! `total_stock` inside the caller's transaction, so the aggregate always
//! equals the sum of the product's batch quantities and no caller can
//! observe the two out of step. Batch and product rows are locked before
//! mutation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Batch row as read under lock
#[derive(Debug, Clone, FromRow)]
pub struct BatchRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub lot_label: String,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
}

/// Product row as read under lock
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub reference_buy_price: Decimal,
    pub reference_sell_price: Decimal,
    pub total_stock: i32,
}

/// Lock a product row for the duration of the transaction
pub async fn lock_product(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
) -> AppResult<ProductRow> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, reference_buy_price, reference_sell_price, total_stock
        FROM products
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Lock a batch row for the duration of the transaction
pub async fn lock_batch(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: Uuid,
) -> AppResult<BatchRow> {
    sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, product_id, lot_label, expiry_date, quantity
        FROM batches
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(batch_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Batch".to_string()))
}

/// Lock all batches of a product, in stable id order
pub async fn lock_product_batches(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
) -> AppResult<Vec<BatchRow>> {
    let batches = sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, product_id, lot_label, expiry_date, quantity
        FROM batches
        WHERE product_id = $1
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(batches)
}

/// Find a batch by its (product, lot label) key, locking it if present
pub async fn lock_batch_by_label(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    lot_label: &str,
) -> AppResult<Option<BatchRow>> {
    let batch = sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, product_id, lot_label, expiry_date, quantity
        FROM batches
        WHERE product_id = $1 AND lot_label = $2
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .bind(lot_label)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(batch)
}

/// Create an empty batch for a product
///
/// New stock arrives through `credit`, so a freshly created batch starts
/// at zero quantity.
pub async fn create_batch(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    lot_label: &str,
    expiry_date: NaiveDate,
) -> AppResult<Uuid> {
    let batch_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO batches (product_id, lot_label, expiry_date, quantity)
        VALUES ($1, $2, $3, 0)
        RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(lot_label)
    .bind(expiry_date)
    .fetch_one(&mut **tx)
    .await?;

    Ok(batch_id)
}

/// Increase a batch's quantity and the owning product's aggregate
pub async fn credit(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::ValidationError(
            "Credit quantity must be positive".to_string(),
        ));
    }

    let batch = lock_batch(tx, batch_id).await?;
    apply_delta(tx, &batch, quantity).await
}

/// Decrease a batch's quantity and the owning product's aggregate
///
/// Fails with `InsufficientStock` when the batch holds less than the
/// requested quantity; nothing is written in that case.
pub async fn debit(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::ValidationError(
            "Debit quantity must be positive".to_string(),
        ));
    }

    let batch = lock_batch(tx, batch_id).await?;
    if batch.quantity < quantity {
        return Err(AppError::InsufficientStock {
            requested: quantity,
            available: batch.quantity,
        });
    }

    apply_delta(tx, &batch, -quantity).await
}

/// Set a batch to an absolute quantity, moving the aggregate by the
/// difference. Used only by stocktake. Returns the previous quantity.
pub async fn set_absolute(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: Uuid,
    new_quantity: i32,
) -> AppResult<i32> {
    if new_quantity < 0 {
        return Err(AppError::ValidationError(
            "Batch quantity cannot be negative".to_string(),
        ));
    }

    let batch = lock_batch(tx, batch_id).await?;
    apply_delta(tx, &batch, new_quantity - batch.quantity).await?;
    Ok(batch.quantity)
}

/// Apply a signed quantity delta to a locked batch and its product
async fn apply_delta(
    tx: &mut Transaction<'_, Postgres>,
    batch: &BatchRow,
    delta: i32,
) -> AppResult<()> {
    if delta == 0 {
        return Ok(());
    }

    sqlx::query("UPDATE batches SET quantity = quantity + $1, updated_at = NOW() WHERE id = $2")
        .bind(delta)
        .bind(batch.id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "UPDATE products SET total_stock = total_stock + $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(delta)
    .bind(batch.product_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
