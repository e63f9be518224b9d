//! Customer Cancel Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dispatch_app::domain::orders::models::ActorRole;

use crate::{
    auth::require_role, extensions::*, orders::errors::into_status_error, state::State,
};

/// Cancel Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CancelOrderRequest {
    /// Why the customer is cancelling; stored on the order and in the
    /// audit trail.
    pub reason: String,
}

/// Order Cancelled Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderCancelledResponse {
    pub order_uuid: Uuid,
    pub status: String,
    pub actor_uuid: Uuid,
    pub actor_role: String,
}

/// Customer Cancel Handler
///
/// Customers may cancel their own orders until the kitchen hands off.
#[endpoint(
    tags("customer"),
    summary = "Cancel Order",
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::BAD_REQUEST, description = "Order can no longer be cancelled"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the customer's order"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order changed concurrently"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.cancel",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<CancelOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderCancelledResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    require_role(&actor, ActorRole::Customer)?;

    let request = json.into_inner();
    let order = order.into_inner();

    if request.reason.trim().is_empty() {
        return Err(StatusError::bad_request().brief("Cancellation reason is required"));
    }

    tracing::Span::current().record("order_uuid", tracing::field::display(order));

    let change = state
        .app
        .orders
        .cancel_order(actor.user, order.into(), request.reason)
        .await
        .map_err(into_status_error)?;

    tracing::info!(order_uuid = %order, from = %change.from, "customer cancelled order");

    Ok(Json(OrderCancelledResponse {
        order_uuid: order,
        status: change.to.to_string(),
        actor_uuid: actor.user.into_uuid(),
        actor_role: actor.role.to_string(),
    }))
}
