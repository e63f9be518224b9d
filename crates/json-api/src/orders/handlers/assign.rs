//! Driver Self-Assignment Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dispatch_app::domain::orders::models::ActorRole;

use crate::{
    auth::require_role, extensions::*, orders::errors::into_status_error, state::State,
};

/// Order Assigned Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderAssignedResponse {
    pub order_uuid: Uuid,
    pub driver_uuid: Uuid,
    pub status: String,
}

/// Order Assign Handler
///
/// Lets a driver claim a `ready`, unassigned order. Exactly one of any
/// number of concurrent claims succeeds; losers receive a 409.
#[endpoint(
    tags("driver"),
    summary = "Assign Order To Driver",
    responses(
        (status_code = StatusCode::OK, description = "Order assigned"),
        (status_code = StatusCode::BAD_REQUEST, description = "Order not ready for assignment"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a driver"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order already assigned to another driver"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.assign",
    skip(order, depot),
    fields(order_uuid = tracing::field::Empty, driver_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderAssignedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    require_role(&actor, ActorRole::Driver)?;

    let order = order.into_inner();

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("driver_uuid", tracing::field::display(actor.user));

    let assigned = state
        .app
        .orders
        .assign_driver(order.into(), actor.user)
        .await
        .map_err(into_status_error)?;

    tracing::info!(order_uuid = %order, driver_uuid = %actor.user, "driver assigned to order");

    Ok(Json(OrderAssignedResponse {
        order_uuid: order,
        driver_uuid: actor.user.into_uuid(),
        status: assigned.status.to_string(),
    }))
}
