//! Transaction helpers for order-level operations
//!
//! Every order, return, and stocktake runs as one serializable unit of
//! work. Serialization failures and deadlocks are retried a bounded
//! number of times before surfacing as `Busy`.

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{AppError, AppResult};

/// Attempts per operation before giving up with `Busy`
pub const MAX_TX_ATTEMPTS: u32 = 3;

/// Begin a serializable transaction
pub async fn begin_serializable(db: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    let mut tx = db.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// True for Postgres serialization failures (40001) and deadlocks (40P01)
pub fn is_serialization_conflict(err: &AppError) -> bool {
    match err {
        AppError::DatabaseError(sqlx::Error::Database(db_err)) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}
