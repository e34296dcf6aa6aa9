//! Batch allocation tests
//!
//! Tests for first-expiry-first-out planning:
//! - Draws follow ascending (expiry date, batch id) order
//! - Expired stock is never drawn
//! - A request that cannot be covered fails without a partial plan

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::allocation::{plan_sale, sellable_quantity, AllocationError, BatchSnapshot};
use uuid::Uuid;

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

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A single batch covers the whole request
    #[test]
    fn test_single_batch_covers_request() {
        let today = date(2026, 1, 1);
        let batches = vec![batch(1, date(2026, 6, 1), 100)];

        let plan = plan_sale(&batches, 40, today).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, Uuid::from_u128(1));
        assert_eq!(plan[0].quantity, 40);
    }

    /// Earlier expiry is drawn first even when listed later
    #[test]
    fn test_earliest_expiry_drawn_first() {
        let today = date(2026, 1, 1);
        let batches = vec![
            batch(1, date(2026, 9, 1), 50),
            batch(2, date(2026, 3, 1), 50),
        ];

        let plan = plan_sale(&batches, 10, today).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, Uuid::from_u128(2));
    }

    /// A request spanning batches drains the earlier one completely
    #[test]
    fn test_spanning_request_drains_earlier_batch() {
        let today = date(2026, 1, 1);
        let batches = vec![
            batch(1, date(2026, 3, 1), 6),
            batch(2, date(2026, 5, 1), 20),
        ];

        let plan = plan_sale(&batches, 10, today).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].quantity, 6);
        assert_eq!(plan[1].batch_id, Uuid::from_u128(2));
        assert_eq!(plan[1].quantity, 4);
    }

    /// A batch expiring today is not sellable
    #[test]
    fn test_batch_expiring_today_excluded() {
        let today = date(2026, 1, 15);
        let batches = vec![
            batch(1, date(2026, 1, 15), 30),
            batch(2, date(2026, 1, 16), 5),
        ];

        assert_eq!(sellable_quantity(&batches, today), 5);
        let err = plan_sale(&batches, 6, today).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientStock {
                requested: 6,
                available: 5
            }
        );
    }

    /// Empty batches contribute nothing
    #[test]
    fn test_empty_batches_skipped() {
        let today = date(2026, 1, 1);
        let batches = vec![
            batch(1, date(2026, 2, 1), 0),
            batch(2, date(2026, 3, 1), 8),
        ];

        let plan = plan_sale(&batches, 8, today).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, Uuid::from_u128(2));
    }

    /// No stock at all reports zero available
    #[test]
    fn test_no_stock_reports_zero_available() {
        let today = date(2026, 1, 1);
        let err = plan_sale(&[], 1, today).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientStock {
                requested: 1,
                available: 0
            }
        );
    }

    /// Zero and negative requests are rejected before any planning
    #[test]
    fn test_non_positive_requests_rejected() {
        let today = date(2026, 1, 1);
        let batches = vec![batch(1, date(2026, 2, 1), 5)];

        assert_eq!(
            plan_sale(&batches, 0, today),
            Err(AllocationError::NonPositiveQuantity)
        );
        assert_eq!(
            plan_sale(&batches, -1, today),
            Err(AllocationError::NonPositiveQuantity)
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for a batch snapshot with bounded quantity and expiry
    fn batch_strategy() -> impl Strategy<Value = BatchSnapshot> {
        (1u128..=50, 0i64..400, 0i32..=50).prop_map(|(id, expiry_offset, quantity)| {
            BatchSnapshot {
                batch_id: Uuid::from_u128(id),
                expiry_date: date(2026, 1, 1) + chrono::Duration::days(expiry_offset),
                quantity,
            }
        })
    }

    fn batches_strategy() -> impl Strategy<Value = Vec<BatchSnapshot>> {
        prop::collection::vec(batch_strategy(), 0..12)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A successful plan draws exactly the requested quantity
        #[test]
        fn prop_plan_total_equals_request(
            batches in batches_strategy(),
            requested in 1i32..=200
        ) {
            let today = date(2026, 2, 1);
            if let Ok(plan) = plan_sale(&batches, requested, today) {
                let drawn: i32 = plan.iter().map(|d| d.quantity).sum();
                prop_assert_eq!(drawn, requested);
            }
        }

        /// A plan never draws more than a batch holds, and only from
        /// sellable batches
        #[test]
        fn prop_plan_respects_batch_quantities(
            batches in batches_strategy(),
            requested in 1i32..=200
        ) {
            let today = date(2026, 2, 1);
            if let Ok(plan) = plan_sale(&batches, requested, today) {
                for draw in &plan {
                    let source = batches
                        .iter()
                        .find(|b| b.batch_id == draw.batch_id)
                        .expect("draw from a known batch");
                    prop_assert!(draw.quantity > 0);
                    prop_assert!(draw.quantity <= source.quantity);
                    prop_assert!(source.expiry_date > today);
                }
            }
        }

        /// Draws are ordered by ascending (expiry date, batch id)
        #[test]
        fn prop_plan_is_fefo_ordered(
            batches in batches_strategy(),
            requested in 1i32..=200
        ) {
            let today = date(2026, 2, 1);
            if let Ok(plan) = plan_sale(&batches, requested, today) {
                let keys: Vec<_> = plan
                    .iter()
                    .map(|d| {
                        let b = batches.iter().find(|b| b.batch_id == d.batch_id).unwrap();
                        (b.expiry_date, b.batch_id)
                    })
                    .collect();
                let mut sorted = keys.clone();
                sorted.sort();
                prop_assert_eq!(keys, sorted);
            }
        }

        /// Planning succeeds exactly when the sellable quantity covers
        /// the request
        #[test]
        fn prop_success_iff_sellable_covers_request(
            batches in batches_strategy(),
            requested in 1i32..=200
        ) {
            let today = date(2026, 2, 1);
            let available = sellable_quantity(&batches, today);
            match plan_sale(&batches, requested, today) {
                Ok(_) => prop_assert!(available >= requested),
                Err(AllocationError::InsufficientStock { available: reported, .. }) => {
                    prop_assert!(available < requested);
                    prop_assert_eq!(reported, available);
                }
                Err(AllocationError::NonPositiveQuantity) => {
                    prop_assert!(requested <= 0);
                }
            }
        }

        /// A failed plan leaves nothing drawn: planning is all or nothing
        #[test]
        fn prop_failure_returns_no_partial_plan(
            batches in batches_strategy(),
        ) {
            let today = date(2026, 2, 1);
            let available = sellable_quantity(&batches, today);
            let result = plan_sale(&batches, available + 1, today);
            prop_assert!(result.is_err());
        }
    }
}

// ============================================================================
// Multi-Line Planning Simulation
// ============================================================================

#[cfg(test)]
mod multi_line_tests {
    use super::*;

    /// Plan several lines against one snapshot, decrementing it as each
    /// line claims stock
    fn plan_lines(
        mut snapshot: Vec<BatchSnapshot>,
        requests: &[i32],
        today: NaiveDate,
    ) -> Result<Vec<Vec<shared::allocation::BatchDraw>>, AllocationError> {
        let mut plans = Vec::new();
        for &requested in requests {
            let plan = plan_sale(&snapshot, requested, today)?;
            for draw in &plan {
                let batch = snapshot
                    .iter_mut()
                    .find(|b| b.batch_id == draw.batch_id)
                    .unwrap();
                batch.quantity -= draw.quantity;
            }
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Two lines for the same product see each other's claims
    #[test]
    fn test_later_line_sees_earlier_claims() {
        let today = date(2026, 1, 1);
        let snapshot = vec![
            batch(1, date(2026, 2, 1), 10),
            batch(2, date(2026, 4, 1), 10),
        ];

        let plans = plan_lines(snapshot, &[8, 8], today).unwrap();
        assert_eq!(plans[0].len(), 1);
        assert_eq!(plans[0][0].batch_id, Uuid::from_u128(1));
        // Second line gets the remainder of batch 1 then spills into batch 2
        assert_eq!(plans[1][0].batch_id, Uuid::from_u128(1));
        assert_eq!(plans[1][0].quantity, 2);
        assert_eq!(plans[1][1].batch_id, Uuid::from_u128(2));
        assert_eq!(plans[1][1].quantity, 6);
    }

    /// When a later line cannot be covered the whole order fails
    #[test]
    fn test_order_fails_when_any_line_fails() {
        let today = date(2026, 1, 1);
        let snapshot = vec![batch(1, date(2026, 2, 1), 10)];

        let result = plan_lines(snapshot, &[8, 8], today);
        assert_eq!(
            result,
            Err(AllocationError::InsufficientStock {
                requested: 8,
                available: 2
            })
        );
    }
}
