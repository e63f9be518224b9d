//! Admin Override Handler

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

use dispatch_app::domain::orders::models::{ActorRole, AdminOverride};

use crate::{
    auth::require_role,
    extensions::*,
    orders::{
        errors::into_status_error,
        requests::{OrderStatusUpdatedResponse, parse_status},
    },
    state::State,
};

/// Admin Update Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AdminUpdateOrderRequest {
    /// Target status; admins may move an order anywhere
    pub status: String,

    /// Driver to place on the order, for driver-carried statuses
    #[serde(default)]
    pub driver_uuid: Option<Uuid>,

    /// Extra context recorded alongside the mandatory audit entry
    #[serde(default)]
    pub notes: Option<String>,
}

/// Admin Override Handler
///
/// Every override writes an audit entry tagged "admin override".
#[endpoint(
    tags("admin"),
    summary = "Override Order (admin)",
    responses(
        (status_code = StatusCode::OK, description = "Order updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid override payload"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not an admin"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order changed concurrently"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.admin_update",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty, target = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<AdminUpdateOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderStatusUpdatedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    require_role(&actor, ActorRole::Admin)?;

    let request = json.into_inner();
    let order = order.into_inner();
    let target = parse_status(&request.status)?;

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("target", tracing::field::display(target));

    let change = state
        .app
        .orders
        .admin_override(
            actor.user,
            order.into(),
            AdminOverride {
                status: target,
                driver: request.driver_uuid.map(Into::into),
                notes: request.notes,
            },
        )
        .await
        .map_err(into_status_error)?;

    tracing::info!(order_uuid = %order, from = %change.from, to = %change.to, "admin override applied");

    Ok(Json(OrderStatusUpdatedResponse::new(change, actor)))
}
