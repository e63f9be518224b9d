//! Order Details Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dispatch_app::domain::orders::models::{Order, OrderDetails, OrderItem, OrderStatusHistory};

use crate::{extensions::*, orders::errors::into_status_error, state::State};

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,
    pub customer_uuid: Uuid,
    pub restaurant_uuid: Uuid,
    pub driver_uuid: Option<Uuid>,
    pub delivery_address_uuid: Option<Uuid>,
    pub status: String,
    pub subtotal: u64,
    pub tax: u64,
    pub delivery_fee: u64,
    pub discount: u64,
    pub total: u64,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    pub placed_at: Option<String>,
    pub confirmed_at: Option<String>,
    pub ready_at: Option<String>,
    pub delivered_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub estimated_delivery_at: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Order Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_at_time: u64,
    pub quantity: u32,
    pub customizations: serde_json::Value,
    pub line_total: u64,
}

/// Status History Entry Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct StatusHistoryResponse {
    pub uuid: Uuid,
    pub user_uuid: Option<Uuid>,
    pub from_status: Option<String>,
    pub to_status: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Order Details Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderDetailsResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    pub status_history: Vec<StatusHistoryResponse>,
}

fn render_timestamp(timestamp: Timestamp) -> String {
    timestamp.to_string()
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            customer_uuid: order.customer.into_uuid(),
            restaurant_uuid: order.restaurant.into_uuid(),
            driver_uuid: order.driver.map(Into::into),
            delivery_address_uuid: order.delivery_address.map(Into::into),
            status: order.status.to_string(),
            subtotal: order.subtotal,
            tax: order.tax,
            delivery_fee: order.delivery_fee,
            discount: order.discount,
            total: order.total,
            special_instructions: order.special_instructions,
            cancellation_reason: order.cancellation_reason,
            placed_at: order.placed_at.map(render_timestamp),
            confirmed_at: order.confirmed_at.map(render_timestamp),
            ready_at: order.ready_at.map(render_timestamp),
            delivered_at: order.delivered_at.map(render_timestamp),
            cancelled_at: order.cancelled_at.map(render_timestamp),
            estimated_delivery_at: order.estimated_delivery_at.map(render_timestamp),
            is_active: order.is_active,
            created_at: render_timestamp(order.created_at),
            updated_at: render_timestamp(order.updated_at),
        }
    }
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            uuid: item.uuid.into_uuid(),
            name: item.name,
            description: item.description,
            price_at_time: item.price_at_time,
            quantity: item.quantity,
            customizations: item.customizations,
            line_total: item.line_total,
        }
    }
}

impl From<OrderStatusHistory> for StatusHistoryResponse {
    fn from(entry: OrderStatusHistory) -> Self {
        Self {
            uuid: entry.uuid.into_uuid(),
            user_uuid: entry.user.map(Into::into),
            from_status: entry.from_status.map(|status| status.to_string()),
            to_status: entry.to_status.to_string(),
            notes: entry.notes,
            created_at: render_timestamp(entry.created_at),
        }
    }
}

impl From<OrderDetails> for OrderDetailsResponse {
    fn from(details: OrderDetails) -> Self {
        Self {
            order: details.order.into(),
            items: details.items.into_iter().map(Into::into).collect(),
            status_history: details.history.into_iter().map(Into::into).collect(),
        }
    }
}

/// Order Details Handler
///
/// Order tracking for every role; the service scopes visibility to the
/// owning customer, the assigned driver, the owning vendor, or admins.
#[endpoint(
    tags("orders"),
    summary = "Get Order Details",
    responses(
        (status_code = StatusCode::OK, description = "Order details"),
        (status_code = StatusCode::FORBIDDEN, description = "Not visible to this actor"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.get",
    skip(order, depot),
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderDetailsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let order = order.into_inner();

    tracing::Span::current().record("order_uuid", tracing::field::display(order));

    let details = state
        .app
        .orders
        .get_order(actor, order.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(details.into()))
}
