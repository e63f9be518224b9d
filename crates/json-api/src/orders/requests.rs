//! Shared request/response payloads for order status endpoints.

use salvo::{http::StatusError, oapi::ToSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dispatch_app::domain::orders::models::{Actor, OrderStatus, StatusChange};

/// Update Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateOrderStatusRequest {
    /// Requested target status
    pub status: String,

    /// Optional note recorded in the audit trail
    #[serde(default)]
    pub notes: Option<String>,
}

/// Order Status Updated Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderStatusUpdatedResponse {
    pub order_uuid: Uuid,
    pub from_status: String,
    pub to_status: String,
    pub actor_uuid: Uuid,
    pub actor_role: String,
}

impl OrderStatusUpdatedResponse {
    pub(crate) fn new(change: StatusChange, actor: Actor) -> Self {
        Self {
            order_uuid: change.order.into_uuid(),
            from_status: change.from.to_string(),
            to_status: change.to.to_string(),
            actor_uuid: actor.user.into_uuid(),
            actor_role: actor.role.to_string(),
        }
    }
}

/// Parse a wire status, rejecting unknown spellings as a 400.
pub(crate) fn parse_status(raw: &str) -> Result<OrderStatus, StatusError> {
    raw.parse()
        .map_err(|_ignored| StatusError::bad_request().brief(format!("Unknown order status `{raw}`")))
}
