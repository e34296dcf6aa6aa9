//! Return service for sales and purchase returns
//!
//! Returns reverse a prior order's ledger effect exactly. The returnable
//! quantity for a (order, batch) pair is read from the persisted order
//! lines minus what earlier returns already reversed, never re-derived
//! from batch state, so repeated returns can never exceed what the order
//! originally moved.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::doc_id::DocKind;
use shared::models::{PurchaseReturn, SalesReturn};
use shared::validation::validate_quantity;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{document_id, ledger, tx};

/// Return service
#[derive(Clone)]
pub struct ReturnsService {
    db: PgPool,
}

/// Input for a line-level return
#[derive(Debug, Deserialize)]
pub struct ReturnLineInput {
    pub order_id: String,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub reason: Option<String>,
}

/// Input for a full sales refund
#[derive(Debug, Deserialize)]
pub struct ReverseSaleInput {
    pub order_id: String,
    pub reason: Option<String>,
}

/// Result of a full refund, one return document per batch credited back
#[derive(Debug, Clone, Serialize)]
pub struct ReverseSaleResult {
    pub order_id: String,
    pub returns: Vec<SalesReturn>,
    pub total_amount: Decimal,
}

/// Quantity and value an order moved through one batch
#[derive(Debug, FromRow)]
struct LineTotals {
    batch_id: Uuid,
    quantity: i64,
    amount: Decimal,
}

impl ReturnsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Return part of a sales order's draw from one batch
    pub async fn return_sale_line(
        &self,
        actor_id: Uuid,
        input: ReturnLineInput,
    ) -> AppResult<SalesReturn> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        for attempt in 1..=tx::MAX_TX_ATTEMPTS {
            match self.return_sale_line_tx(actor_id, &input).await {
                Err(err) if tx::is_serialization_conflict(&err) => {
                    tracing::warn!("return_sale_line conflict on attempt {}, retrying", attempt);
                }
                other => return other,
            }
        }
        Err(AppError::Busy)
    }

    async fn return_sale_line_tx(
        &self,
        actor_id: Uuid,
        input: &ReturnLineInput,
    ) -> AppResult<SalesReturn> {
        let mut dbtx = tx::begin_serializable(&self.db).await?;

        let customer_id = require_active_sale(&mut dbtx, &input.order_id).await?;
        let result = apply_sales_return(
            &mut dbtx,
            actor_id,
            &input.order_id,
            customer_id,
            input.batch_id,
            input.quantity,
            input.reason.as_deref(),
        )
        .await?;

        dbtx.commit().await?;

        tracing::info!(
            "Created sales return {} against {}",
            result.id,
            input.order_id
        );
        Ok(result)
    }

    /// Refund a sales order in full
    ///
    /// Credits back every remaining returnable quantity across the order's
    /// lines and flips the order to reversed. Quantities already returned
    /// line by line are not returned twice.
    pub async fn reverse_sale(
        &self,
        actor_id: Uuid,
        input: ReverseSaleInput,
    ) -> AppResult<ReverseSaleResult> {
        for attempt in 1..=tx::MAX_TX_ATTEMPTS {
            match self.reverse_sale_tx(actor_id, &input).await {
                Err(err) if tx::is_serialization_conflict(&err) => {
                    tracing::warn!("reverse_sale conflict on attempt {}, retrying", attempt);
                }
                other => return other,
            }
        }
        Err(AppError::Busy)
    }

    async fn reverse_sale_tx(
        &self,
        actor_id: Uuid,
        input: &ReverseSaleInput,
    ) -> AppResult<ReverseSaleResult> {
        let mut dbtx = tx::begin_serializable(&self.db).await?;

        let customer_id = require_active_sale(&mut dbtx, &input.order_id).await?;

        let sold = sqlx::query_as::<_, LineTotals>(
            r#"
            SELECT batch_id, SUM(quantity)::BIGINT AS quantity, SUM(subtotal) AS amount
            FROM sales_lines
            WHERE order_id = $1
            GROUP BY batch_id
            ORDER BY batch_id
            "#,
        )
        .bind(&input.order_id)
        .fetch_all(&mut *dbtx)
        .await?;

        let mut returns = Vec::new();
        let mut total_amount = Decimal::ZERO;
        for totals in &sold {
            let returned =
                returned_sale_quantity(&mut dbtx, &input.order_id, totals.batch_id).await?;
            let remaining = totals.quantity - returned;
            if remaining <= 0 {
                continue;
            }
            let result = apply_sales_return(
                &mut dbtx,
                actor_id,
                &input.order_id,
                customer_id,
                totals.batch_id,
                remaining as i32,
                input.reason.as_deref(),
            )
            .await?;
            total_amount += result.amount;
            returns.push(result);
        }

        sqlx::query("UPDATE sales_orders SET status = 'reversed' WHERE id = $1")
            .bind(&input.order_id)
            .execute(&mut *dbtx)
            .await?;

        dbtx.commit().await?;

        tracing::info!(
            "Reversed sales order {} across {} batches",
            input.order_id,
            returns.len()
        );
        Ok(ReverseSaleResult {
            order_id: input.order_id.clone(),
            returns,
            total_amount,
        })
    }

    /// Return part of a purchase order's credit to the supplier
    pub async fn return_purchase_line(
        &self,
        actor_id: Uuid,
        input: ReturnLineInput,
    ) -> AppResult<PurchaseReturn> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        for attempt in 1..=tx::MAX_TX_ATTEMPTS {
            match self.return_purchase_line_tx(actor_id, &input).await {
                Err(err) if tx::is_serialization_conflict(&err) => {
                    tracing::warn!(
                        "return_purchase_line conflict on attempt {}, retrying",
                        attempt
                    );
                }
                other => return other,
            }
        }
        Err(AppError::Busy)
    }

    async fn return_purchase_line_tx(
        &self,
        actor_id: Uuid,
        input: &ReturnLineInput,
    ) -> AppResult<PurchaseReturn> {
        let mut dbtx = tx::begin_serializable(&self.db).await?;
        let today = Utc::now().date_naive();

        crate::services::purchase::require_active_purchase(&mut dbtx, &input.order_id).await?;

        let credited = sqlx::query_as::<_, LineTotals>(
            r#"
            SELECT batch_id, SUM(quantity)::BIGINT AS quantity, SUM(subtotal) AS amount
            FROM purchase_lines
            WHERE order_id = $1 AND batch_id = $2
            GROUP BY batch_id
            "#,
        )
        .bind(&input.order_id)
        .bind(input.batch_id)
        .fetch_optional(&mut *dbtx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase line".to_string()))?;

        let returned: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM purchase_returns WHERE order_id = $1 AND batch_id = $2",
        )
        .bind(&input.order_id)
        .bind(input.batch_id)
        .fetch_one(&mut *dbtx)
        .await?;

        let returnable = credited.quantity - returned;
        if i64::from(input.quantity) > returnable {
            return Err(AppError::ValidationError(format!(
                "Returnable quantity is {}, requested {}",
                returnable, input.quantity
            )));
        }

        ledger::debit(&mut dbtx, input.batch_id, input.quantity).await?;

        let amount = per_unit_amount(credited.amount, credited.quantity, input.quantity);
        let return_id =
            document_id::reserve_document_id(&mut dbtx, DocKind::PurchaseReturn, today).await?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_returns (id, order_id, batch_id, quantity, amount, reason, effective_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING created_at
            "#,
        )
        .bind(&return_id)
        .bind(&input.order_id)
        .bind(input.batch_id)
        .bind(input.quantity)
        .bind(amount)
        .bind(&input.reason)
        .bind(today)
        .bind(actor_id)
        .fetch_one(&mut *dbtx)
        .await?;

        dbtx.commit().await?;

        tracing::info!(
            "Created purchase return {} against {}",
            return_id,
            input.order_id
        );
        Ok(PurchaseReturn {
            id: return_id,
            order_id: input.order_id.clone(),
            batch_id: input.batch_id,
            quantity: input.quantity,
            amount,
            reason: input.reason.clone(),
            effective_date: today,
            created_by: actor_id,
            created_at,
        })
    }
}

/// Check that a sales order exists and is active, returning its customer
async fn require_active_sale(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
) -> AppResult<Option<Uuid>> {
    let row: Option<(String, Option<Uuid>)> = sqlx::query_as(
        "SELECT status, customer_id FROM sales_orders WHERE id = $1 FOR UPDATE",
    )
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await?;
    let (status, customer_id) =
        row.ok_or_else(|| AppError::NotFound("Sales order".to_string()))?;
    if status != "active" {
        return Err(AppError::ValidationError(
            "Sales order is not active".to_string(),
        ));
    }
    Ok(customer_id)
}

/// Quantity already returned against a (sales order, batch) pair
async fn returned_sale_quantity(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
    batch_id: Uuid,
) -> AppResult<i64> {
    let returned: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM sales_returns WHERE order_id = $1 AND batch_id = $2",
    )
    .bind(order_id)
    .bind(batch_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(returned)
}

/// Credit a batch back for a sales return and record the return document
///
/// The caller has already verified the order is active; the returnable cap
/// is enforced here so every path through a sales return shares it.
async fn apply_sales_return(
    tx: &mut Transaction<'_, Postgres>,
    actor_id: Uuid,
    order_id: &str,
    customer_id: Option<Uuid>,
    batch_id: Uuid,
    quantity: i32,
    reason: Option<&str>,
) -> AppResult<SalesReturn> {
    let today = Utc::now().date_naive();

    let sold = sqlx::query_as::<_, LineTotals>(
        r#"
        SELECT batch_id, SUM(quantity)::BIGINT AS quantity, SUM(subtotal) AS amount
        FROM sales_lines
        WHERE order_id = $1 AND batch_id = $2
        GROUP BY batch_id
        "#,
    )
    .bind(order_id)
    .bind(batch_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Sales line".to_string()))?;

    let returned = returned_sale_quantity(tx, order_id, batch_id).await?;
    let returnable = sold.quantity - returned;
    if i64::from(quantity) > returnable {
        return Err(AppError::ValidationError(format!(
            "Returnable quantity is {}, requested {}",
            returnable, quantity
        )));
    }

    ledger::credit(tx, batch_id, quantity).await?;

    let amount = per_unit_amount(sold.amount, sold.quantity, quantity);
    if let Some(customer_id) = customer_id {
        sqlx::query(
            "UPDATE customers SET total_spend = total_spend - $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(amount)
        .bind(customer_id)
        .execute(&mut **tx)
        .await?;
    }

    let return_id = document_id::reserve_document_id(tx, DocKind::SalesReturn, today).await?;

    let created_at: DateTime<Utc> = sqlx::query_scalar(
        r#"
        INSERT INTO sales_returns (id, order_id, batch_id, quantity, amount, reason, effective_date, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING created_at
        "#,
    )
    .bind(&return_id)
    .bind(order_id)
    .bind(batch_id)
    .bind(quantity)
    .bind(amount)
    .bind(reason)
    .bind(today)
    .bind(actor_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(SalesReturn {
        id: return_id,
        order_id: order_id.to_string(),
        batch_id,
        quantity,
        amount,
        reason: reason.map(str::to_string),
        effective_date: today,
        created_by: actor_id,
        created_at,
    })
}

/// Value of `quantity` units out of a line total of `total_quantity`
/// units worth `total_amount`, at the line's effective unit price
fn per_unit_amount(total_amount: Decimal, total_quantity: i64, quantity: i32) -> Decimal {
    if total_quantity == 0 {
        return Decimal::ZERO;
    }
    (total_amount / Decimal::from(total_quantity) * Decimal::from(quantity)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_unit_amount_whole_line() {
        let amount = per_unit_amount(Decimal::new(12000, 2), 10, 10);
        assert_eq!(amount, Decimal::new(12000, 2));
    }

    #[test]
    fn test_per_unit_amount_partial() {
        // 10 units for 120.00 -> 4 units are 48.00
        let amount = per_unit_amount(Decimal::new(12000, 2), 10, 4);
        assert_eq!(amount, Decimal::new(4800, 2));
    }

    #[test]
    fn test_per_unit_amount_rounds_to_cents() {
        // 3 units for 10.00 -> 1 unit rounds to 3.33
        let amount = per_unit_amount(Decimal::new(1000, 2), 3, 1);
        assert_eq!(amount, Decimal::new(333, 2));
    }
}
