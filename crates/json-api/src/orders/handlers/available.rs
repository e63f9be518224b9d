//! Available Orders Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dispatch_app::domain::orders::models::{ActorRole, Order};

use crate::{
    auth::require_role, extensions::*, orders::errors::into_status_error, state::State,
};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Available Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AvailableOrderResponse {
    pub order_uuid: Uuid,
    pub restaurant_uuid: Uuid,
    pub status: String,
    pub total: u64,
    pub placed_at: Option<String>,
}

impl From<Order> for AvailableOrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_uuid: order.uuid.into_uuid(),
            restaurant_uuid: order.restaurant.into_uuid(),
            status: order.status.to_string(),
            total: order.total,
            placed_at: order.placed_at.map(|placed_at| placed_at.to_string()),
        }
    }
}

/// Available Orders Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AvailableOrdersResponse {
    pub orders: Vec<AvailableOrderResponse>,
}

/// Available Orders Handler
///
/// The feed a driver refreshes to pick work: unassigned active orders,
/// ready-first. Losing an assignment race means refreshing this list and
/// choosing again.
#[endpoint(
    tags("driver"),
    summary = "List Available Orders",
    responses(
        (status_code = StatusCode::OK, description = "Available orders"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a driver"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "orders.available", skip(limit, offset, depot), err)]
pub(crate) async fn handler(
    limit: QueryParam<i64, false>,
    offset: QueryParam<i64, false>,
    depot: &mut Depot,
) -> Result<Json<AvailableOrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    require_role(&actor, ActorRole::Driver)?;

    let limit = limit.into_inner().unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = offset.into_inner().unwrap_or(0).max(0);

    let orders = state
        .app
        .orders
        .available_orders(limit, offset)
        .await
        .map_err(into_status_error)?;

    Ok(Json(AvailableOrdersResponse {
        orders: orders.into_iter().map(Into::into).collect(),
    }))
}
