//! Batch allocation planner
//!
//! Sales draw stock from discrete expiring batches under a
//! first-expiry-first-out policy. The planner works on an in-memory
//! snapshot of a product's batches and either produces a complete plan or
//! fails without one; callers apply the plan to the ledger only after
//! planning has succeeded for every requested line.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Snapshot of a single batch taken at planning time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub batch_id: Uuid,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
}

/// One planned draw against a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub quantity: i32,
}

/// Planner failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },
    #[error("requested quantity must be positive")]
    NonPositiveQuantity,
}

/// Quantity sellable today: non-expired batches with stock remaining.
///
/// Expired batches keep their quantity on the books but are never
/// eligible for sale.
pub fn sellable_quantity(batches: &[BatchSnapshot], today: NaiveDate) -> i32 {
    batches
        .iter()
        .filter(|b| b.quantity > 0 && b.expiry_date > today)
        .map(|b| b.quantity)
        .sum()
}

/// Plan a sale of `requested` units against the given batch snapshot.
///
/// Eligible batches are walked in ascending `(expiry_date, batch_id)`
/// order, drawing up to each batch's remaining quantity until the request
/// is satisfied. If the eligible supply cannot cover the request the plan
/// fails whole; no partial plan is ever returned.
pub fn plan_sale(
    batches: &[BatchSnapshot],
    requested: i32,
    today: NaiveDate,
) -> Result<Vec<BatchDraw>, AllocationError> {
    if requested <= 0 {
        return Err(AllocationError::NonPositiveQuantity);
    }

    let mut eligible: Vec<&BatchSnapshot> = batches
        .iter()
        .filter(|b| b.quantity > 0 && b.expiry_date > today)
        .collect();
    eligible.sort_by_key(|b| (b.expiry_date, b.batch_id));

    let available: i32 = eligible.iter().map(|b| b.quantity).sum();
    if available < requested {
        return Err(AllocationError::InsufficientStock {
            requested,
            available,
        });
    }

    let mut plan = Vec::new();
    let mut remaining = requested;
    for batch in eligible {
        if remaining == 0 {
            break;
        }
        let draw = remaining.min(batch.quantity);
        plan.push(BatchDraw {
            batch_id: batch.batch_id,
            quantity: draw,
        });
        remaining -= draw;
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn batch(id: u128, expiry: NaiveDate, quantity: i32) -> BatchSnapshot {
        BatchSnapshot {
            batch_id: Uuid::from_u128(id),
            expiry_date: expiry,
            quantity,
        }
    }

    #[test]
    fn test_fefo_spans_batches_in_expiry_order() {
        let today = date(2026, 1, 1);
        let batches = vec![
            batch(3, date(2026, 6, 1), 5),
            batch(1, date(2026, 2, 1), 5),
            batch(2, date(2026, 4, 1), 5),
        ];
        let plan = plan_sale(&batches, 7, today).unwrap();
        assert_eq!(
            plan,
            vec![
                BatchDraw {
                    batch_id: Uuid::from_u128(1),
                    quantity: 5
                },
                BatchDraw {
                    batch_id: Uuid::from_u128(2),
                    quantity: 2
                },
            ]
        );
    }

    #[test]
    fn test_equal_expiry_breaks_tie_on_batch_id() {
        let today = date(2026, 1, 1);
        let expiry = date(2026, 3, 1);
        let batches = vec![batch(9, expiry, 4), batch(2, expiry, 4)];
        let plan = plan_sale(&batches, 6, today).unwrap();
        assert_eq!(plan[0].batch_id, Uuid::from_u128(2));
        assert_eq!(plan[0].quantity, 4);
        assert_eq!(plan[1].batch_id, Uuid::from_u128(9));
        assert_eq!(plan[1].quantity, 2);
    }

    #[test]
    fn test_expired_batches_are_not_drawn() {
        let today = date(2026, 1, 10);
        let batches = vec![
            batch(1, date(2026, 1, 10), 50),
            batch(2, date(2026, 1, 5), 50),
            batch(3, date(2026, 2, 1), 3),
        ];
        assert_eq!(sellable_quantity(&batches, today), 3);
        let err = plan_sale(&batches, 4, today).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientStock {
                requested: 4,
                available: 3
            }
        );
        let plan = plan_sale(&batches, 3, today).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, Uuid::from_u128(3));
    }

    #[test]
    fn test_insufficient_stock_reports_available() {
        let today = date(2026, 1, 1);
        let batches = vec![batch(1, date(2026, 2, 1), 2), batch(2, date(2026, 3, 1), 3)];
        let err = plan_sale(&batches, 10, today).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientStock {
                requested: 10,
                available: 5
            }
        );
    }

    #[test]
    fn test_rejects_non_positive_request() {
        let today = date(2026, 1, 1);
        let batches = vec![batch(1, date(2026, 2, 1), 5)];
        assert_eq!(
            plan_sale(&batches, 0, today),
            Err(AllocationError::NonPositiveQuantity)
        );
        assert_eq!(
            plan_sale(&batches, -3, today),
            Err(AllocationError::NonPositiveQuantity)
        );
    }

    #[test]
    fn test_plan_totals_match_request() {
        let today = date(2026, 1, 1);
        let batches = vec![
            batch(1, date(2026, 2, 1), 7),
            batch(2, date(2026, 2, 15), 1),
            batch(3, date(2026, 3, 1), 9),
        ];
        for requested in 1..=17 {
            let plan = plan_sale(&batches, requested, today).unwrap();
            let drawn: i32 = plan.iter().map(|d| d.quantity).sum();
            assert_eq!(drawn, requested);
            assert!(plan.iter().all(|d| d.quantity > 0));
        }
    }
}
