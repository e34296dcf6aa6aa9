//! Document identifier scheme for orders and returns
//!
//! Every order and return carries a human-readable identifier with an
//! embedded date and a daily sequence number, e.g. `S202601150042` for the
//! 42nd sales order issued on 2026-01-15. Sequence space is four digits per
//! day per document kind.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest sequence number a single day can hold for one document kind
pub const MAX_DAILY_SEQ: u32 = 9999;

/// Kinds of numbered documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Purchase,
    Sale,
    PurchaseReturn,
    SalesReturn,
}

impl DocKind {
    /// Identifier prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            DocKind::Purchase => "P",
            DocKind::Sale => "S",
            DocKind::PurchaseReturn => "PR",
            DocKind::SalesReturn => "SR",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Purchase => "purchase",
            DocKind::Sale => "sale",
            DocKind::PurchaseReturn => "purchase_return",
            DocKind::SalesReturn => "sales_return",
        }
    }
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from parsing a document identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocIdError {
    #[error("unknown document prefix")]
    UnknownPrefix,
    #[error("malformed document id")]
    Malformed,
    #[error("invalid date in document id")]
    InvalidDate,
    #[error("sequence out of range")]
    SequenceOutOfRange,
}

/// A document identifier decomposed into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDocumentId {
    pub kind: DocKind,
    pub date: NaiveDate,
    pub seq: u32,
}

/// Format a document identifier as `{prefix}{YYYYMMDD}{seq:04}`
pub fn format_document_id(kind: DocKind, date: NaiveDate, seq: u32) -> String {
    format!("{}{}{:04}", kind.prefix(), date.format("%Y%m%d"), seq)
}

/// Parse a document identifier back into kind, date, and sequence.
///
/// Two-letter prefixes are tried before single-letter ones so `PR...` is
/// never misread as a purchase order.
pub fn parse_document_id(id: &str) -> Result<ParsedDocumentId, DocIdError> {
    const PREFIXES: [(&str, DocKind); 4] = [
        ("PR", DocKind::PurchaseReturn),
        ("SR", DocKind::SalesReturn),
        ("P", DocKind::Purchase),
        ("S", DocKind::Sale),
    ];

    let (kind, rest) = PREFIXES
        .iter()
        .find_map(|(prefix, kind)| id.strip_prefix(prefix).map(|rest| (*kind, rest)))
        .ok_or(DocIdError::UnknownPrefix)?;

    if rest.len() != 12 || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err(DocIdError::Malformed);
    }

    let (date_part, seq_part) = rest.split_at(8);
    let date =
        NaiveDate::parse_from_str(date_part, "%Y%m%d").map_err(|_| DocIdError::InvalidDate)?;
    let seq: u32 = seq_part.parse().map_err(|_| DocIdError::Malformed)?;
    if seq == 0 || seq > MAX_DAILY_SEQ {
        return Err(DocIdError::SequenceOutOfRange);
    }

    Ok(ParsedDocumentId { kind, date, seq })
}
