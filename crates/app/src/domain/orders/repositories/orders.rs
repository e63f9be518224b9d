//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::orders::{
    models::{NewOrder, Order, OrderStatus, OrderUuid, RestaurantUuid, UserUuid},
    repositories::{amount_to_db, try_get_amount, try_get_status},
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LIST_AVAILABLE_ORDERS_SQL: &str = include_str!("../sql/list_available_orders.sql");
const ASSIGN_DRIVER_SQL: &str = include_str!("../sql/assign_driver.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("../sql/update_order_status.sql");
const CANCEL_ORDER_SQL: &str = include_str!("../sql/cancel_order.sql");
const ADMIN_UPDATE_ORDER_SQL: &str = include_str!("../sql/admin_update_order.sql");
const GET_RESTAURANT_VENDOR_SQL: &str = include_str!("../sql/get_restaurant_vendor.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.customer.into_uuid())
            .bind(order.restaurant.into_uuid())
            .bind(order.delivery_address.map(|address| address.into_uuid()))
            .bind(amount_to_db(order.subtotal, "subtotal")?)
            .bind(amount_to_db(order.tax, "tax")?)
            .bind(amount_to_db(order.delivery_fee, "delivery_fee")?)
            .bind(amount_to_db(order.discount, "discount")?)
            .bind(amount_to_db(order.total, "total")?)
            .bind(order.special_instructions.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_available_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(LIST_AVAILABLE_ORDERS_SQL)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut **tx)
            .await
    }

    /// Conditional driver assignment: takes effect only when the order is
    /// still `ready`, unassigned and active. `None` means the predicate did
    /// not match and the caller must classify why.
    pub(crate) async fn assign_driver(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        driver: UserUuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(ASSIGN_DRIVER_SQL)
            .bind(order.into_uuid())
            .bind(driver.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Compare-and-set status update guarded by the expected current
    /// status. Returns the number of rows affected; zero means another
    /// request changed the order first.
    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(expected.as_str())
            .bind(target.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Cancel with a stored reason, guarded by the expected current status.
    pub(crate) async fn cancel_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        expected: OrderStatus,
        reason: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CANCEL_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(expected.as_str())
            .bind(reason)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Admin override: any target status, optionally re-pointing the
    /// driver. Still guarded by the expected current status so concurrent
    /// changes surface as conflicts instead of silent overwrites.
    pub(crate) async fn admin_update_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        expected: OrderStatus,
        target: OrderStatus,
        driver: Option<UserUuid>,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(ADMIN_UPDATE_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(expected.as_str())
            .bind(target.as_str())
            .bind(driver.map(|driver| driver.into_uuid()))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn restaurant_vendor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
    ) -> Result<Option<UserUuid>, sqlx::Error> {
        let vendor: Option<Uuid> = query_scalar(GET_RESTAURANT_VENDOR_SQL)
            .bind(restaurant.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(vendor.map(UserUuid::from_uuid))
    }
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            customer: UserUuid::from_uuid(row.try_get("customer_uuid")?),
            restaurant: RestaurantUuid::from_uuid(row.try_get("restaurant_uuid")?),
            driver: row
                .try_get::<Option<Uuid>, _>("driver_uuid")?
                .map(UserUuid::from_uuid),
            delivery_address: row
                .try_get::<Option<Uuid>, _>("delivery_address_uuid")?
                .map(Into::into),
            status: try_get_status(row, "status")?,
            subtotal: try_get_amount(row, "subtotal")?,
            tax: try_get_amount(row, "tax")?,
            delivery_fee: try_get_amount(row, "delivery_fee")?,
            discount: try_get_amount(row, "discount")?,
            total: try_get_amount(row, "total")?,
            special_instructions: row.try_get("special_instructions")?,
            cancellation_reason: row.try_get("cancellation_reason")?,
            placed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("placed_at")?
                .map(SqlxTimestamp::to_jiff),
            confirmed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("confirmed_at")?
                .map(SqlxTimestamp::to_jiff),
            ready_at: row
                .try_get::<Option<SqlxTimestamp>, _>("ready_at")?
                .map(SqlxTimestamp::to_jiff),
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            cancelled_at: row
                .try_get::<Option<SqlxTimestamp>, _>("cancelled_at")?
                .map(SqlxTimestamp::to_jiff),
            estimated_delivery_at: row
                .try_get::<Option<SqlxTimestamp>, _>("estimated_delivery_at")?
                .map(SqlxTimestamp::to_jiff),
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
