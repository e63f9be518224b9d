//! Database connection management

use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction, query};

/// SQL used to bound each transaction with a statement timeout.
pub const SET_STATEMENT_TIMEOUT_SQL: &str =
    "SELECT set_config('statement_timeout', $1, true)";

/// Default per-transaction statement timeout.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
    statement_timeout: Duration,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_statement_timeout(pool, DEFAULT_STATEMENT_TIMEOUT)
    }

    #[must_use]
    pub fn with_statement_timeout(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Begin a transaction with a transaction-local statement timeout, so a
    /// slow store call pins a request worker for only a bounded time.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or applying the
    /// timeout fails.
    pub async fn begin_transaction(
        &self,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_STATEMENT_TIMEOUT_SQL)
            .bind(self.statement_timeout.as_millis().to_string())
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}
