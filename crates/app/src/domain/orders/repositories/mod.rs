//! Postgres repositories for the orders domain.

mod history;
mod items;
mod orders;

pub(crate) use history::PgStatusHistoryRepository;
pub(crate) use items::PgOrderItemsRepository;
pub(crate) use orders::PgOrdersRepository;

use sqlx::{Row, postgres::PgRow};

use crate::domain::orders::models::OrderStatus;

/// Decode a money column (integer minor units) into `u64`.
pub(super) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(col)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Decode a status column through its wire spelling.
pub(super) fn try_get_status(row: &PgRow, col: &str) -> Result<OrderStatus, sqlx::Error> {
    let raw: String = row.try_get(col)?;

    raw.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Encode a `u64` amount for a `BIGINT` bind.
pub(super) fn amount_to_db(amount: u64, col: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}
