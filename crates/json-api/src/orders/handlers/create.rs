//! Create Order Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dispatch_app::domain::orders::models::{
    Actor, ActorRole, NewOrder, NewOrderItem, OrderItemUuid, OrderUuid,
};

use crate::{
    auth::require_role, extensions::*, orders::errors::into_status_error, state::State,
};

/// Tax applied to the item subtotal, in basis points.
const TAX_RATE_BASIS_POINTS: u64 = 850;

/// Flat delivery fee in minor units.
const FLAT_DELIVERY_FEE: u64 = 500;

/// Create Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderRequest {
    pub restaurant_uuid: Uuid,
    #[serde(default)]
    pub delivery_address_uuid: Option<Uuid>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    pub items: Vec<CreateOrderItemRequest>,
}

/// Create Order Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderItemRequest {
    /// Menu item name, snapshotted onto the order
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in minor units
    pub price: u64,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Option<serde_json::Value>,
}

/// Order Created Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderCreatedResponse {
    pub order_uuid: Uuid,
    pub status: String,
    pub subtotal: u64,
    pub tax: u64,
    pub delivery_fee: u64,
    pub total: u64,
}

/// Price the request into a `NewOrder`, rejecting malformed quantities and
/// out-of-range amounts.
fn priced_order(actor: Actor, request: CreateOrderRequest) -> Result<NewOrder, StatusError> {
    if request.items.is_empty() {
        return Err(StatusError::bad_request().brief("Order must contain at least one item"));
    }

    let out_of_range = || StatusError::bad_request().brief("Order amounts are out of range");

    let mut items = Vec::with_capacity(request.items.len());
    let mut subtotal: u64 = 0;

    for item in request.items {
        if item.quantity == 0 {
            return Err(StatusError::bad_request().brief("Item quantity must be at least 1"));
        }

        let line_total = item
            .price
            .checked_mul(u64::from(item.quantity))
            .ok_or_else(out_of_range)?;

        subtotal = subtotal.checked_add(line_total).ok_or_else(out_of_range)?;

        items.push(NewOrderItem {
            uuid: OrderItemUuid::new(),
            name: item.name,
            description: item.description,
            price_at_time: item.price,
            quantity: item.quantity,
            customizations: item.customizations.unwrap_or_else(|| serde_json::json!({})),
            line_total,
        });
    }

    let tax = subtotal
        .checked_mul(TAX_RATE_BASIS_POINTS)
        .ok_or_else(out_of_range)?
        / 10_000;

    let total = subtotal
        .checked_add(tax)
        .and_then(|sum| sum.checked_add(FLAT_DELIVERY_FEE))
        .ok_or_else(out_of_range)?;

    Ok(NewOrder {
        uuid: OrderUuid::new(),
        customer: actor.user,
        restaurant: request.restaurant_uuid.into(),
        delivery_address: request.delivery_address_uuid.map(Into::into),
        special_instructions: request.special_instructions,
        subtotal,
        tax,
        delivery_fee: FLAT_DELIVERY_FEE,
        discount: 0,
        total,
        items,
    })
}

/// Create Order Handler
#[endpoint(
    tags("customer"),
    summary = "Create Order",
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a customer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.create",
    skip(json, depot, res),
    fields(
        customer_uuid = tracing::field::Empty,
        restaurant_uuid = tracing::field::Empty,
        items_count = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderCreatedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    require_role(&actor, ActorRole::Customer)?;

    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("customer_uuid", tracing::field::display(actor.user));
    span.record(
        "restaurant_uuid",
        tracing::field::display(request.restaurant_uuid),
    );
    span.record("items_count", tracing::field::display(request.items.len()));

    let order = priced_order(actor, request)?;

    let created = state
        .app
        .orders
        .create_order(order)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/api/orders/{}", created.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    tracing::info!(order_uuid = %created.uuid, total = created.total, "created order");

    Ok(Json(OrderCreatedResponse {
        order_uuid: created.uuid.into_uuid(),
        status: created.status.to_string(),
        subtotal: created.subtotal,
        tax: created.tax,
        delivery_fee: created.delivery_fee,
        total: created.total,
    }))
}
