//! Purchase order service
//!
//! Receiving stock credits batches keyed by (product, lot label). A lot
//! label that already exists for the product must carry the same expiry
//! date, otherwise the line is rejected rather than silently merging two
//! different lots. Cancellation reverses every credit, and refuses to run
//! when any credited batch has since been drawn below its credited
//! amount.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::doc_id::DocKind;
use shared::models::{OrderStatus, PurchaseLine, PurchaseOrder};
use shared::validation::{validate_expiry_date, validate_lot_label, validate_quantity, validate_unit_price};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::sales::OrderResult;
use crate::services::{document_id, ledger, tx};

/// Purchase order service
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
}

/// Input for creating a purchase order
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseInput {
    pub supplier_id: Option<Uuid>,
    pub lines: Vec<PurchaseLineInput>,
}

/// One received product line
#[derive(Debug, Deserialize)]
pub struct PurchaseLineInput {
    pub product_id: Uuid,
    pub lot_label: String,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Credited quantity per batch, as persisted on the order's lines
#[derive(Debug, FromRow)]
struct BatchContribution {
    batch_id: Uuid,
    quantity: i64,
}

/// A purchase order with its persisted lines
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseDetail {
    pub order: PurchaseOrder,
    pub lines: Vec<PurchaseLine>,
}

#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: String,
    supplier_id: Option<Uuid>,
    status: String,
    total_amount: Decimal,
    effective_date: NaiveDate,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl PurchaseOrderRow {
    fn into_order(self) -> AppResult<PurchaseOrder> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "unknown order status '{}' on {}",
                self.status,
                self.id
            ))
        })?;
        Ok(PurchaseOrder {
            id: self.id,
            supplier_id: self.supplier_id,
            status,
            total_amount: self.total_amount,
            effective_date: self.effective_date,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PurchaseLineRow {
    id: i64,
    order_id: String,
    product_id: Uuid,
    batch_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<PurchaseLineRow> for PurchaseLine {
    fn from(row: PurchaseLineRow) -> Self {
        PurchaseLine {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            batch_id: row.batch_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

impl PurchaseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch a purchase order and its batch-level lines
    pub async fn get_purchase(&self, order_id: &str) -> AppResult<PurchaseDetail> {
        let row: Option<PurchaseOrderRow> = sqlx::query_as(
            r#"
            SELECT id, supplier_id, status, total_amount, effective_date, created_by, created_at
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;
        let order = row
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?
            .into_order()?;

        let lines: Vec<PurchaseLineRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, product_id, batch_id, quantity, unit_price, subtotal
            FROM purchase_lines
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseDetail {
            order,
            lines: lines.into_iter().map(PurchaseLine::from).collect(),
        })
    }

    /// Create a purchase order, crediting each line into its batch
    pub async fn create_purchase(
        &self,
        actor_id: Uuid,
        input: CreatePurchaseInput,
    ) -> AppResult<OrderResult> {
        if input.lines.is_empty() {
            return Err(AppError::ValidationError(
                "Order must have at least one line".to_string(),
            ));
        }
        let today = Utc::now().date_naive();
        for line in &input.lines {
            validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
            validate_unit_price(line.unit_price).map_err(|msg| AppError::Validation {
                field: "unit_price".to_string(),
                message: msg.to_string(),
            })?;
            validate_lot_label(&line.lot_label).map_err(|msg| AppError::Validation {
                field: "lot_label".to_string(),
                message: msg.to_string(),
            })?;
            validate_expiry_date(line.expiry_date, today).map_err(|msg| AppError::Validation {
                field: "expiry_date".to_string(),
                message: msg.to_string(),
            })?;
        }

        for attempt in 1..=tx::MAX_TX_ATTEMPTS {
            match self.create_purchase_tx(actor_id, &input).await {
                Err(err) if tx::is_serialization_conflict(&err) => {
                    tracing::warn!("create_purchase conflict on attempt {}, retrying", attempt);
                }
                other => return other,
            }
        }
        Err(AppError::Busy)
    }

    async fn create_purchase_tx(
        &self,
        actor_id: Uuid,
        input: &CreatePurchaseInput,
    ) -> AppResult<OrderResult> {
        let mut dbtx = tx::begin_serializable(&self.db).await?;
        let today = Utc::now().date_naive();

        if let Some(supplier_id) = input.supplier_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE id = $1")
                .bind(supplier_id)
                .fetch_one(&mut *dbtx)
                .await?;
            if exists == 0 {
                return Err(AppError::NotFound("Supplier".to_string()));
            }
        }

        // Resolve every line's batch before any credit. A lot label that
        // exists with a different expiry date is a conflict, never a merge.
        let mut batch_ids: Vec<Uuid> = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            ledger::lock_product(&mut dbtx, line.product_id).await?;
            let batch_id = match ledger::lock_batch_by_label(
                &mut dbtx,
                line.product_id,
                &line.lot_label,
            )
            .await?
            {
                Some(batch) => {
                    if batch.expiry_date != line.expiry_date {
                        return Err(AppError::BatchConflict(format!(
                            "Lot {} already exists with expiry {}",
                            line.lot_label, batch.expiry_date
                        )));
                    }
                    batch.id
                }
                None => {
                    ledger::create_batch(&mut dbtx, line.product_id, &line.lot_label, line.expiry_date)
                        .await?
                }
            };
            batch_ids.push(batch_id);
        }

        let mut total = Decimal::ZERO;
        for line in &input.lines {
            total += line.unit_price * Decimal::from(line.quantity);
        }

        let order_id = document_id::reserve_document_id(&mut dbtx, DocKind::Purchase, today).await?;

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (id, supplier_id, status, total_amount, effective_date, created_by)
            VALUES ($1, $2, 'active', $3, $4, $5)
            "#,
        )
        .bind(&order_id)
        .bind(input.supplier_id)
        .bind(total)
        .bind(today)
        .bind(actor_id)
        .execute(&mut *dbtx)
        .await?;

        for (line, batch_id) in input.lines.iter().zip(&batch_ids) {
            ledger::credit(&mut dbtx, *batch_id, line.quantity).await?;
            let subtotal = line.unit_price * Decimal::from(line.quantity);
            sqlx::query(
                r#"
                INSERT INTO purchase_lines (order_id, product_id, batch_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&order_id)
            .bind(line.product_id)
            .bind(batch_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(subtotal)
            .execute(&mut *dbtx)
            .await?;
        }

        dbtx.commit().await?;

        tracing::info!("Created purchase order {} for {}", order_id, total);
        Ok(OrderResult {
            id: order_id,
            total_amount: total,
        })
    }

    /// Cancel a purchase order, reversing every credited quantity
    ///
    /// Refuses with `PartiallyConsumed` when any credited batch no longer
    /// holds its credited quantity, so cancellation never drives a batch
    /// negative.
    pub async fn cancel_purchase(&self, order_id: &str) -> AppResult<()> {
        for attempt in 1..=tx::MAX_TX_ATTEMPTS {
            match self.cancel_purchase_tx(order_id).await {
                Err(err) if tx::is_serialization_conflict(&err) => {
                    tracing::warn!("cancel_purchase conflict on attempt {}, retrying", attempt);
                }
                other => return other,
            }
        }
        Err(AppError::Busy)
    }

    async fn cancel_purchase_tx(&self, order_id: &str) -> AppResult<()> {
        let mut dbtx = tx::begin_serializable(&self.db).await?;

        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *dbtx)
        .await?;
        let status = status.ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;
        if status != "active" {
            return Err(AppError::ValidationError(
                "Purchase order is not active".to_string(),
            ));
        }

        let contributions = sqlx::query_as::<_, BatchContribution>(
            r#"
            SELECT batch_id, SUM(quantity)::BIGINT AS quantity
            FROM purchase_lines
            WHERE order_id = $1
            GROUP BY batch_id
            ORDER BY batch_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *dbtx)
        .await?;

        // Check every batch before debiting any, so a partially consumed
        // order leaves all batches untouched.
        for contribution in &contributions {
            let batch = ledger::lock_batch(&mut dbtx, contribution.batch_id).await?;
            if i64::from(batch.quantity) < contribution.quantity {
                return Err(AppError::PartiallyConsumed(format!(
                    "Batch {} holds {} of {} credited units",
                    batch.lot_label, batch.quantity, contribution.quantity
                )));
            }
        }

        for contribution in &contributions {
            ledger::debit(&mut dbtx, contribution.batch_id, contribution.quantity as i32).await?;
        }

        sqlx::query("UPDATE purchase_orders SET status = 'reversed' WHERE id = $1")
            .bind(order_id)
            .execute(&mut *dbtx)
            .await?;

        dbtx.commit().await?;

        tracing::info!("Cancelled purchase order {}", order_id);
        Ok(())
    }
}

/// Check whether a purchase order exists and is active, for reuse by
/// return flows that operate on its lines.
pub async fn require_active_purchase(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
) -> AppResult<()> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM purchase_orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await?;
    let status = status.ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;
    if status != "active" {
        return Err(AppError::ValidationError(
            "Purchase order is not active".to_string(),
        ));
    }
    Ok(())
}
