//! Document identifier tests
//!
//! Tests for the `{prefix}{YYYYMMDD}{seq}` identifier scheme:
//! - Formatting and parsing are inverse operations
//! - Two-letter prefixes are never misread as single-letter kinds
//! - Sequence space is bounded per day per kind

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::doc_id::{
    format_document_id, parse_document_id, DocIdError, DocKind, MAX_DAILY_SEQ,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const ALL_KINDS: [DocKind; 4] = [
    DocKind::Purchase,
    DocKind::Sale,
    DocKind::PurchaseReturn,
    DocKind::SalesReturn,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Identifiers embed the date and zero-padded sequence
    #[test]
    fn test_format_shape() {
        let id = format_document_id(DocKind::Sale, date(2026, 1, 5), 7);
        assert_eq!(id, "S202601050007");

        let id = format_document_id(DocKind::PurchaseReturn, date(2026, 12, 31), 1234);
        assert_eq!(id, "PR202612311234");
    }

    /// Sequence 1 and the daily maximum both format and parse
    #[test]
    fn test_sequence_bounds_format() {
        let d = date(2026, 6, 1);
        let first = format_document_id(DocKind::Purchase, d, 1);
        let last = format_document_id(DocKind::Purchase, d, MAX_DAILY_SEQ);

        assert_eq!(parse_document_id(&first).unwrap().seq, 1);
        assert_eq!(parse_document_id(&last).unwrap().seq, MAX_DAILY_SEQ);
    }

    /// `PR` and `SR` identifiers never parse as `P` or `S` documents
    #[test]
    fn test_two_letter_prefix_wins() {
        let pr = parse_document_id("PR202601150001").unwrap();
        assert_eq!(pr.kind, DocKind::PurchaseReturn);

        let sr = parse_document_id("SR202601150001").unwrap();
        assert_eq!(sr.kind, DocKind::SalesReturn);
    }

    /// Malformed identifiers are rejected with a specific error
    #[test]
    fn test_malformed_identifiers_rejected() {
        assert_eq!(
            parse_document_id("Q202601150001"),
            Err(DocIdError::UnknownPrefix)
        );
        assert_eq!(parse_document_id("S2026"), Err(DocIdError::Malformed));
        assert_eq!(
            parse_document_id("S202699990001"),
            Err(DocIdError::InvalidDate)
        );
        assert_eq!(
            parse_document_id("S202601150000"),
            Err(DocIdError::SequenceOutOfRange)
        );
    }

    /// Distinct kinds on the same day and sequence yield distinct ids
    #[test]
    fn test_kinds_do_not_collide() {
        let d = date(2026, 3, 3);
        let ids: Vec<String> = ALL_KINDS
            .iter()
            .map(|&kind| format_document_id(kind, d, 42))
            .collect();

        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn kind_strategy() -> impl Strategy<Value = DocKind> {
        prop_oneof![
            Just(DocKind::Purchase),
            Just(DocKind::Sale),
            Just(DocKind::PurchaseReturn),
            Just(DocKind::SalesReturn),
        ]
    }

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| date(2024, 1, 1) + chrono::Duration::days(offset))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Parsing a formatted identifier recovers kind, date, and sequence
        #[test]
        fn prop_format_parse_round_trip(
            kind in kind_strategy(),
            d in date_strategy(),
            seq in 1u32..=MAX_DAILY_SEQ
        ) {
            let id = format_document_id(kind, d, seq);
            let parsed = parse_document_id(&id).unwrap();
            prop_assert_eq!(parsed.kind, kind);
            prop_assert_eq!(parsed.date, d);
            prop_assert_eq!(parsed.seq, seq);
        }

        /// Identifier length is fixed per kind
        #[test]
        fn prop_identifier_length_fixed(
            kind in kind_strategy(),
            d in date_strategy(),
            seq in 1u32..=MAX_DAILY_SEQ
        ) {
            let id = format_document_id(kind, d, seq);
            prop_assert_eq!(id.len(), kind.prefix().len() + 12);
        }

        /// Distinct sequences on the same day yield distinct identifiers
        #[test]
        fn prop_sequences_unique_within_day(
            kind in kind_strategy(),
            d in date_strategy(),
            seq_a in 1u32..=MAX_DAILY_SEQ,
            seq_b in 1u32..=MAX_DAILY_SEQ
        ) {
            let a = format_document_id(kind, d, seq_a);
            let b = format_document_id(kind, d, seq_b);
            if seq_a != seq_b {
                prop_assert_ne!(a, b);
            } else {
                prop_assert_eq!(a, b);
            }
        }
    }
}

// ============================================================================
// Counter Simulation
// ============================================================================

#[cfg(test)]
mod counter_tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    /// Simulate the per-day-per-kind counter the reservation query keeps
    struct CounterTable {
        counters: HashMap<(DocKind, NaiveDate), u32>,
    }

    impl CounterTable {
        fn new() -> Self {
            Self {
                counters: HashMap::new(),
            }
        }

        fn reserve(&mut self, kind: DocKind, d: NaiveDate) -> Result<String, &'static str> {
            let seq = self.counters.entry((kind, d)).or_insert(0);
            *seq += 1;
            if *seq > MAX_DAILY_SEQ {
                return Err("sequence exhausted");
            }
            Ok(format_document_id(kind, d, *seq))
        }
    }

    /// Every reservation on one day is unique
    #[test]
    fn test_reservations_unique() {
        let mut table = CounterTable::new();
        let d = date(2026, 1, 15);

        let mut seen = HashSet::new();
        for _ in 0..500 {
            let id = table.reserve(DocKind::Sale, d).unwrap();
            assert!(seen.insert(id));
        }
    }

    /// Counters for different kinds and days are independent
    #[test]
    fn test_counters_independent() {
        let mut table = CounterTable::new();
        let d1 = date(2026, 1, 15);
        let d2 = date(2026, 1, 16);

        assert_eq!(table.reserve(DocKind::Sale, d1).unwrap(), "S202601150001");
        assert_eq!(
            table.reserve(DocKind::Purchase, d1).unwrap(),
            "P202601150001"
        );
        assert_eq!(table.reserve(DocKind::Sale, d2).unwrap(), "S202601160001");
        assert_eq!(table.reserve(DocKind::Sale, d1).unwrap(), "S202601150002");
    }

    /// The 10000th reservation of a day fails
    #[test]
    fn test_sequence_exhaustion() {
        let mut table = CounterTable::new();
        let d = date(2026, 1, 15);
        table.counters.insert((DocKind::SalesReturn, d), MAX_DAILY_SEQ - 1);

        assert!(table.reserve(DocKind::SalesReturn, d).is_ok());
        assert_eq!(
            table.reserve(DocKind::SalesReturn, d),
            Err("sequence exhausted")
        );
    }
}
