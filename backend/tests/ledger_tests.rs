//! Batch ledger tests
//!
//! Tests for the two ledger invariants:
//! - A product's aggregate stock equals the sum of its batch quantities
//! - No batch quantity is ever negative
//!
//! The ledger itself is exercised through an in-memory simulation of the
//! same credit, debit, and absolute-set operations the service applies,
//! including the reversal flows built on top of them.

use proptest::prelude::*;
use std::collections::HashMap;

// ============================================================================
// Ledger Simulation
// ============================================================================

/// In-memory product with its batches, mirroring the persisted shape
#[derive(Debug, Clone)]
struct SimProduct {
    total_stock: i32,
    batches: HashMap<u32, i32>,
}

impl SimProduct {
    fn new(batches: &[(u32, i32)]) -> Self {
        let map: HashMap<u32, i32> = batches.iter().copied().collect();
        let total = map.values().sum();
        Self {
            total_stock: total,
            batches: map,
        }
    }

    fn credit(&mut self, batch: u32, quantity: i32) -> Result<(), &'static str> {
        if quantity <= 0 {
            return Err("credit quantity must be positive");
        }
        let entry = self.batches.entry(batch).or_insert(0);
        *entry += quantity;
        self.total_stock += quantity;
        Ok(())
    }

    fn debit(&mut self, batch: u32, quantity: i32) -> Result<(), &'static str> {
        if quantity <= 0 {
            return Err("debit quantity must be positive");
        }
        let entry = self.batches.get_mut(&batch).ok_or("unknown batch")?;
        if *entry < quantity {
            return Err("insufficient stock");
        }
        *entry -= quantity;
        self.total_stock -= quantity;
        Ok(())
    }

    /// Returns the previous quantity, like the stocktake correction
    fn set_absolute(&mut self, batch: u32, quantity: i32) -> Result<i32, &'static str> {
        if quantity < 0 {
            return Err("quantity cannot be negative");
        }
        let entry = self.batches.get_mut(&batch).ok_or("unknown batch")?;
        let previous = *entry;
        self.total_stock += quantity - previous;
        *entry = quantity;
        Ok(previous)
    }

    fn holds_invariants(&self) -> bool {
        let sum: i32 = self.batches.values().sum();
        sum == self.total_stock && self.batches.values().all(|&q| q >= 0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_credit_moves_batch_and_aggregate() {
        let mut product = SimProduct::new(&[(1, 10)]);
        product.credit(1, 5).unwrap();

        assert_eq!(product.batches[&1], 15);
        assert_eq!(product.total_stock, 15);
        assert!(product.holds_invariants());
    }

    #[test]
    fn test_debit_moves_batch_and_aggregate() {
        let mut product = SimProduct::new(&[(1, 10), (2, 4)]);
        product.debit(1, 7).unwrap();

        assert_eq!(product.batches[&1], 3);
        assert_eq!(product.total_stock, 7);
        assert!(product.holds_invariants());
    }

    #[test]
    fn test_debit_beyond_holdings_rejected() {
        let mut product = SimProduct::new(&[(1, 3)]);
        let before = product.clone();

        assert_eq!(product.debit(1, 4), Err("insufficient stock"));
        // Nothing moved on failure
        assert_eq!(product.batches[&1], before.batches[&1]);
        assert_eq!(product.total_stock, before.total_stock);
    }

    #[test]
    fn test_set_absolute_returns_previous() {
        let mut product = SimProduct::new(&[(1, 12)]);

        let previous = product.set_absolute(1, 9).unwrap();
        assert_eq!(previous, 12);
        assert_eq!(product.batches[&1], 9);
        assert_eq!(product.total_stock, 9);
        assert!(product.holds_invariants());
    }

    #[test]
    fn test_set_absolute_can_raise_quantity() {
        let mut product = SimProduct::new(&[(1, 2), (2, 5)]);

        product.set_absolute(1, 8).unwrap();
        assert_eq!(product.total_stock, 13);
        assert!(product.holds_invariants());
    }

    #[test]
    fn test_non_positive_movements_rejected() {
        let mut product = SimProduct::new(&[(1, 5)]);

        assert!(product.credit(1, 0).is_err());
        assert!(product.credit(1, -2).is_err());
        assert!(product.debit(1, 0).is_err());
        assert!(product.set_absolute(1, -1).is_err());
        assert!(product.holds_invariants());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Credit(u32, i32),
        Debit(u32, i32),
        SetAbsolute(u32, i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..5, 1i32..=50).prop_map(|(b, q)| Op::Credit(b, q)),
            (0u32..5, 1i32..=50).prop_map(|(b, q)| Op::Debit(b, q)),
            (0u32..5, 0i32..=50).prop_map(|(b, q)| Op::SetAbsolute(b, q)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The aggregate equals the batch sum after any operation mix,
        /// whether each operation succeeds or fails
        #[test]
        fn prop_aggregate_tracks_batch_sum(
            initial in prop::collection::vec((0u32..5, 0i32..=100), 1..5),
            ops in prop::collection::vec(op_strategy(), 0..40)
        ) {
            let mut product = SimProduct::new(&initial);
            prop_assert!(product.holds_invariants());

            for op in ops {
                let _ = match op {
                    Op::Credit(b, q) => product.credit(b, q).map(|_| 0),
                    Op::Debit(b, q) => product.debit(b, q).map(|_| 0),
                    Op::SetAbsolute(b, q) => product.set_absolute(b, q),
                };
                prop_assert!(product.holds_invariants());
            }
        }

        /// A failed debit leaves the ledger untouched
        #[test]
        fn prop_failed_debit_changes_nothing(
            quantity in 0i32..=20,
            excess in 1i32..=20
        ) {
            let mut product = SimProduct::new(&[(1, quantity)]);
            let before_total = product.total_stock;

            prop_assert!(product.debit(1, quantity + excess).is_err());
            prop_assert_eq!(product.total_stock, before_total);
            prop_assert_eq!(product.batches[&1], quantity);
        }

        /// Credit then equal debit is an identity
        #[test]
        fn prop_credit_debit_round_trip(
            initial in 0i32..=100,
            moved in 1i32..=50
        ) {
            let mut product = SimProduct::new(&[(1, initial)]);

            product.credit(1, moved).unwrap();
            product.debit(1, moved).unwrap();

            prop_assert_eq!(product.batches[&1], initial);
            prop_assert_eq!(product.total_stock, initial);
        }
    }
}

// ============================================================================
// Reversal Flow Simulation
// ============================================================================

#[cfg(test)]
mod reversal_tests {
    use super::*;

    /// Returnable cap bookkeeping for one (order, batch) pair: derived
    /// from the persisted line minus prior returns, never from batch state
    struct ReturnableLine {
        sold: i32,
        returned: i32,
    }

    impl ReturnableLine {
        fn new(sold: i32) -> Self {
            Self { sold, returned: 0 }
        }

        fn return_quantity(
            &mut self,
            product: &mut SimProduct,
            batch: u32,
            quantity: i32,
        ) -> Result<(), &'static str> {
            if quantity <= 0 {
                return Err("quantity must be positive");
            }
            if quantity > self.sold - self.returned {
                return Err("exceeds returnable quantity");
            }
            product.credit(batch, quantity)?;
            self.returned += quantity;
            Ok(())
        }
    }

    #[test]
    fn test_partial_returns_accumulate_to_cap() {
        let mut product = SimProduct::new(&[(1, 0)]);
        let mut line = ReturnableLine::new(10);

        line.return_quantity(&mut product, 1, 4).unwrap();
        line.return_quantity(&mut product, 1, 6).unwrap();
        assert_eq!(product.batches[&1], 10);

        // The line is exhausted
        assert_eq!(
            line.return_quantity(&mut product, 1, 1),
            Err("exceeds returnable quantity")
        );
        assert!(product.holds_invariants());
    }

    #[test]
    fn test_return_cap_ignores_other_stock() {
        // The batch was restocked by an unrelated purchase; the return cap
        // still derives from the order's own lines
        let mut product = SimProduct::new(&[(1, 500)]);
        let mut line = ReturnableLine::new(3);

        assert_eq!(
            line.return_quantity(&mut product, 1, 4),
            Err("exceeds returnable quantity")
        );
        line.return_quantity(&mut product, 1, 3).unwrap();
        assert_eq!(product.batches[&1], 503);
    }

    /// Purchase cancellation refuses when any credited batch was drawn
    /// below its credited quantity, and reverses everything otherwise
    fn cancel_purchase(
        product: &mut SimProduct,
        credits: &[(u32, i32)],
    ) -> Result<(), &'static str> {
        for &(batch, credited) in credits {
            let held = *product.batches.get(&batch).ok_or("unknown batch")?;
            if held < credited {
                return Err("partially consumed");
            }
        }
        for &(batch, credited) in credits {
            product.debit(batch, credited)?;
        }
        Ok(())
    }

    #[test]
    fn test_cancel_reverses_all_credits() {
        let mut product = SimProduct::new(&[(1, 20), (2, 30)]);

        cancel_purchase(&mut product, &[(1, 20), (2, 30)]).unwrap();
        assert_eq!(product.total_stock, 0);
        assert!(product.holds_invariants());
    }

    #[test]
    fn test_cancel_refuses_when_partially_consumed() {
        // Batch 2 was partially sold since the purchase credited it
        let mut product = SimProduct::new(&[(1, 20), (2, 25)]);
        let before = product.clone();

        assert_eq!(
            cancel_purchase(&mut product, &[(1, 20), (2, 30)]),
            Err("partially consumed")
        );
        // No batch was touched, not even the fully coverable one
        assert_eq!(product.batches[&1], before.batches[&1]);
        assert_eq!(product.batches[&2], before.batches[&2]);
        assert_eq!(product.total_stock, before.total_stock);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Selling then returning everything restores the starting ledger
        #[test]
        fn prop_full_reversal_restores_ledger(
            initial in 1i32..=100,
            sold in 1i32..=100
        ) {
            prop_assume!(sold <= initial);
            let mut product = SimProduct::new(&[(1, initial)]);

            product.debit(1, sold).unwrap();
            let mut line = ReturnableLine::new(sold);
            line.return_quantity(&mut product, 1, sold).unwrap();

            prop_assert_eq!(product.batches[&1], initial);
            prop_assert_eq!(product.total_stock, initial);
        }

        /// Returns never push the returned total past what was sold
        #[test]
        fn prop_returns_never_exceed_sold(
            sold in 1i32..=50,
            attempts in prop::collection::vec(1i32..=20, 1..10)
        ) {
            let mut product = SimProduct::new(&[(1, 0)]);
            let mut line = ReturnableLine::new(sold);

            for quantity in attempts {
                let _ = line.return_quantity(&mut product, 1, quantity);
                prop_assert!(line.returned <= sold);
                prop_assert_eq!(product.batches[&1], line.returned);
            }
        }
    }
}
