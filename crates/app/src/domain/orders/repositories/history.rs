//! Status History Repository
//!
//! Append-only; there is deliberately no update or delete here.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::orders::{
    models::{OrderStatus, OrderStatusHistory, OrderUuid, StatusHistoryUuid, UserUuid},
    repositories::try_get_status,
};

const INSERT_STATUS_HISTORY_SQL: &str = include_str!("../sql/insert_status_history.sql");
const LIST_STATUS_HISTORY_SQL: &str = include_str!("../sql/list_status_history.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStatusHistoryRepository;

impl PgStatusHistoryRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        user: Option<UserUuid>,
        from_status: Option<OrderStatus>,
        to_status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<OrderStatusHistory, sqlx::Error> {
        query_as::<Postgres, OrderStatusHistory>(INSERT_STATUS_HISTORY_SQL)
            .bind(StatusHistoryUuid::new().into_uuid())
            .bind(order.into_uuid())
            .bind(user.map(|user| user.into_uuid()))
            .bind(from_status.map(OrderStatus::as_str))
            .bind(to_status.as_str())
            .bind(notes)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
        query_as::<Postgres, OrderStatusHistory>(LIST_STATUS_HISTORY_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderStatusHistory {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let from_status = match row.try_get::<Option<String>, _>("from_status")? {
            Some(_) => Some(try_get_status(row, "from_status")?),
            None => None,
        };

        Ok(Self {
            uuid: StatusHistoryUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            user: row
                .try_get::<Option<Uuid>, _>("user_uuid")?
                .map(UserUuid::from_uuid),
            from_status,
            to_status: try_get_status(row, "to_status")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
