//! App Context

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::orders::{PgOrdersService, events::LoggingEventsHook, service::OrdersService},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub orders: Arc<dyn OrdersService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        statement_timeout: Duration,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::with_statement_timeout(pool, statement_timeout);

        Ok(Self {
            orders: Arc::new(
                PgOrdersService::new(db).with_hook(Arc::new(LoggingEventsHook)),
            ),
        })
    }
}
