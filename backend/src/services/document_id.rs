//! Document identifier reservation
//!
//! Identifiers are reserved from a per-day-per-kind counter row inside
//! the caller's open transaction, so a reservation commits or rolls back
//! together with the document it numbers. Concurrent writers serialize on
//! the counter row instead of racing a max-plus-one read.

use chrono::NaiveDate;
use shared::doc_id::{format_document_id, DocKind, MAX_DAILY_SEQ};
use sqlx::{Postgres, Transaction};

use crate::error::{AppError, AppResult};

/// Reserve the next document id for `kind` on `date`
pub async fn reserve_document_id(
    tx: &mut Transaction<'_, Postgres>,
    kind: DocKind,
    date: NaiveDate,
) -> AppResult<String> {
    let seq: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO document_counters (kind, seq_date, last_seq)
        VALUES ($1, $2, 1)
        ON CONFLICT (kind, seq_date)
        DO UPDATE SET last_seq = document_counters.last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(kind.as_str())
    .bind(date)
    .fetch_one(&mut **tx)
    .await?;

    if seq < 1 || seq as u32 > MAX_DAILY_SEQ {
        return Err(AppError::CapacityExceeded(kind.to_string()));
    }

    Ok(format_document_id(kind, date, seq as u32))
}
