//! Vendor Status Update Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use dispatch_app::domain::orders::models::ActorRole;

use crate::{
    auth::require_role,
    extensions::*,
    orders::{
        errors::into_status_error,
        requests::{OrderStatusUpdatedResponse, UpdateOrderStatusRequest, parse_status},
    },
    state::State,
};

/// Vendor Status Update Handler
///
/// Moves an order through the kitchen leg
/// (`pending → confirmed → preparing → ready`), or cancels it before
/// hand-off. Ownership of the order's restaurant is enforced.
#[endpoint(
    tags("vendor"),
    summary = "Update Order Status (vendor)",
    responses(
        (status_code = StatusCode::OK, description = "Status updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid status transition"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller does not own the restaurant"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order changed concurrently"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.vendor_status",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty, target = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateOrderStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderStatusUpdatedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    require_role(&actor, ActorRole::Vendor)?;

    let request = json.into_inner();
    let order = order.into_inner();
    let target = parse_status(&request.status)?;

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("target", tracing::field::display(target));

    let change = state
        .app
        .orders
        .update_status(actor, order.into(), target, request.notes)
        .await
        .map_err(into_status_error)?;

    tracing::info!(order_uuid = %order, from = %change.from, to = %change.to, "vendor updated order status");

    Ok(Json(OrderStatusUpdatedResponse::new(change, actor)))
}
