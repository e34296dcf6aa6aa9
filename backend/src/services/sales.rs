//! Sales order service
//!
//! Creating a sale plans every requested line against the product's
//! batches before the ledger is touched, so a failure on any line leaves
//! no partial effect. One requested line may fan out into several
//! persisted lines when the allocation spans batches.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::allocation::{plan_sale, BatchDraw, BatchSnapshot};
use shared::doc_id::DocKind;
use shared::models::{OrderStatus, SalesLine, SalesOrder};
use shared::validation::{validate_quantity, validate_unit_price};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{document_id, ledger, tx};

/// Sales order service
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

/// Input for creating a sales order
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub customer_id: Option<Uuid>,
    pub lines: Vec<SaleLineInput>,
}

/// One requested product line
#[derive(Debug, Deserialize)]
pub struct SaleLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Result of a committed order
#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    pub id: String,
    pub total_amount: Decimal,
}

/// A sales order with its persisted lines
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    pub order: SalesOrder,
    pub lines: Vec<SalesLine>,
}

#[derive(Debug, FromRow)]
struct SalesOrderRow {
    id: String,
    customer_id: Option<Uuid>,
    status: String,
    total_amount: Decimal,
    effective_date: NaiveDate,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SalesLineRow {
    id: i64,
    order_id: String,
    product_id: Uuid,
    batch_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<SalesLineRow> for SalesLine {
    fn from(row: SalesLineRow) -> Self {
        SalesLine {
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

impl SalesOrderRow {
    fn into_order(self) -> AppResult<SalesOrder> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "unknown order status '{}' on {}",
                self.status,
                self.id
            ))
        })?;
        Ok(SalesOrder {
            id: self.id,
            customer_id: self.customer_id,
            status,
            total_amount: self.total_amount,
            effective_date: self.effective_date,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

impl SalesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch a sales order and its batch-level lines
    pub async fn get_sale(&self, order_id: &str) -> AppResult<SaleDetail> {
        let row: Option<SalesOrderRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, status, total_amount, effective_date, created_by, created_at
            FROM sales_orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;
        let order = row
            .ok_or_else(|| AppError::NotFound("Sales order".to_string()))?
            .into_order()?;

        let lines: Vec<SalesLineRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, product_id, batch_id, quantity, unit_price, subtotal
            FROM sales_lines
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleDetail {
            order,
            lines: lines.into_iter().map(SalesLine::from).collect(),
        })
    }

    /// Create a sales order, allocating stock first-expiry-first-out
    pub async fn create_sale(
        &self,
        actor_id: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<OrderResult> {
        if input.lines.is_empty() {
            return Err(AppError::ValidationError(
                "Order must have at least one line".to_string(),
            ));
        }
        for line in &input.lines {
            validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
            validate_unit_price(line.unit_price).map_err(|msg| AppError::Validation {
                field: "unit_price".to_string(),
                message: msg.to_string(),
            })?;
        }

        for attempt in 1..=tx::MAX_TX_ATTEMPTS {
            match self.create_sale_tx(actor_id, &input).await {
                Err(err) if tx::is_serialization_conflict(&err) => {
                    tracing::warn!("create_sale conflict on attempt {}, retrying", attempt);
                }
                other => return other,
            }
        }
        Err(AppError::Busy)
    }

    async fn create_sale_tx(
        &self,
        actor_id: Uuid,
        input: &CreateSaleInput,
    ) -> AppResult<OrderResult> {
        let mut dbtx = tx::begin_serializable(&self.db).await?;
        let today = Utc::now().date_naive();

        if let Some(customer_id) = input.customer_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE id = $1")
                .bind(customer_id)
                .fetch_one(&mut *dbtx)
                .await?;
            if exists == 0 {
                return Err(AppError::NotFound("Customer".to_string()));
            }
        }

        // Plan every line against locked batch snapshots before any
        // ledger mutation. Snapshots are decremented as lines are planned
        // so repeated products see what earlier lines already claimed.
        let mut snapshots: HashMap<Uuid, Vec<BatchSnapshot>> = HashMap::new();
        let mut plans: Vec<Vec<BatchDraw>> = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            if !snapshots.contains_key(&line.product_id) {
                ledger::lock_product(&mut dbtx, line.product_id).await?;
                let batches = ledger::lock_product_batches(&mut dbtx, line.product_id).await?;
                snapshots.insert(
                    line.product_id,
                    batches
                        .into_iter()
                        .map(|b| BatchSnapshot {
                            batch_id: b.id,
                            expiry_date: b.expiry_date,
                            quantity: b.quantity,
                        })
                        .collect(),
                );
            }
            let snapshot = snapshots.entry(line.product_id).or_default();
            let plan = plan_sale(snapshot, line.quantity, today)?;
            for draw in &plan {
                if let Some(batch) = snapshot.iter_mut().find(|b| b.batch_id == draw.batch_id) {
                    batch.quantity -= draw.quantity;
                }
            }
            plans.push(plan);
        }

        // Total recomputed from the plan, never taken from the client
        let mut total = Decimal::ZERO;
        for (line, plan) in input.lines.iter().zip(&plans) {
            for draw in plan {
                total += line.unit_price * Decimal::from(draw.quantity);
            }
        }

        let order_id = document_id::reserve_document_id(&mut dbtx, DocKind::Sale, today).await?;

        sqlx::query(
            r#"
            INSERT INTO sales_orders (id, customer_id, status, total_amount, effective_date, created_by)
            VALUES ($1, $2, 'active', $3, $4, $5)
            "#,
        )
        .bind(&order_id)
        .bind(input.customer_id)
        .bind(total)
        .bind(today)
        .bind(actor_id)
        .execute(&mut *dbtx)
        .await?;

        for (line, plan) in input.lines.iter().zip(&plans) {
            for draw in plan {
                ledger::debit(&mut dbtx, draw.batch_id, draw.quantity).await?;
                let subtotal = line.unit_price * Decimal::from(draw.quantity);
                sqlx::query(
                    r#"
                    INSERT INTO sales_lines (order_id, product_id, batch_id, quantity, unit_price, subtotal)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(&order_id)
                .bind(line.product_id)
                .bind(draw.batch_id)
                .bind(draw.quantity)
                .bind(line.unit_price)
                .bind(subtotal)
                .execute(&mut *dbtx)
                .await?;
            }
        }

        if let Some(customer_id) = input.customer_id {
            sqlx::query(
                "UPDATE customers SET total_spend = total_spend + $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(total)
            .bind(customer_id)
            .execute(&mut *dbtx)
            .await?;
        }

        dbtx.commit().await?;

        tracing::info!("Created sales order {} for {}", order_id, total);
        Ok(OrderResult {
            id: order_id,
            total_amount: total,
        })
    }
}
