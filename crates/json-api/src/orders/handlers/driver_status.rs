//! Driver Status Update Handler

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

/// Driver Status Update Handler
///
/// Moves an assigned order along the delivery leg
/// (`driver_assigned → picked_up → in_transit → delivered`).
#[endpoint(
    tags("driver"),
    summary = "Update Order Status (driver)",
    responses(
        (status_code = StatusCode::OK, description = "Status updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid status transition"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not the assigned driver"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order changed concurrently"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.driver_status",
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

    require_role(&actor, ActorRole::Driver)?;

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

    tracing::info!(order_uuid = %order, from = %change.from, to = %change.to, "driver updated order status");

    Ok(Json(OrderStatusUpdatedResponse::new(change, actor)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use dispatch_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        models::{OrderStatus, OrderUuid, StatusChange, UserUuid},
        transitions::TransitionError,
    };

    use crate::test_helpers::{
        ACTOR_ROLE_HEADER, ACTOR_UUID_HEADER, TEST_USER_UUID, orders_service,
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(
            orders,
            Router::with_path("driver/orders/{order}/status").put(handler),
        )
    }

    #[tokio::test]
    async fn test_driver_status_update_success() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_status()
            .once()
            .withf(move |actor, order, target, notes| {
                actor.user == UserUuid::from_uuid(TEST_USER_UUID)
                    && actor.role == ActorRole::Driver
                    && *order == uuid
                    && *target == OrderStatus::PickedUp
                    && notes.as_deref() == Some("picked up at the counter")
            })
            .return_once(move |_, order, _, _| {
                Ok(StatusChange {
                    order,
                    from: OrderStatus::DriverAssigned,
                    to: OrderStatus::PickedUp,
                })
            });

        let mut res = TestClient::put(format!(
            "http://example.com/driver/orders/{uuid}/status"
        ))
        .add_header(ACTOR_UUID_HEADER, TEST_USER_UUID.to_string(), true)
        .add_header(ACTOR_ROLE_HEADER, "driver", true)
        .json(&json!({ "status": "picked_up", "notes": "picked up at the counter" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrderStatusUpdatedResponse = res.take_json().await?;

        assert_eq!(body.order_uuid, uuid.into_uuid());
        assert_eq!(body.from_status, "driver_assigned");
        assert_eq!(body.to_status, "picked_up");
        assert_eq!(body.actor_uuid, TEST_USER_UUID);
        assert_eq!(body.actor_role, "driver");

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_transition_names_both_statuses() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders.expect_update_status().once().return_once(|actor, _, _, _| {
            Err(OrdersServiceError::Transition(
                TransitionError::NotReachable {
                    role: actor.role,
                    from: OrderStatus::DriverAssigned,
                    to: OrderStatus::Delivered,
                },
            ))
        });

        let mut res = TestClient::put(format!(
            "http://example.com/driver/orders/{uuid}/status"
        ))
        .add_header(ACTOR_UUID_HEADER, TEST_USER_UUID.to_string(), true)
        .add_header(ACTOR_ROLE_HEADER, "driver", true)
        .json(&json!({ "status": "delivered" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body = res.take_string().await?;

        assert!(
            body.contains("driver_assigned") && body.contains("delivered"),
            "message should name current and requested status: {body}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_gets_400_without_calling_service() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders.expect_update_status().never();

        let res = TestClient::put(format!(
            "http://example.com/driver/orders/{uuid}/status"
        ))
        .add_header(ACTOR_UUID_HEADER, TEST_USER_UUID.to_string(), true)
        .add_header(ACTOR_ROLE_HEADER, "driver", true)
        .json(&json!({ "status": "teleported" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_unassigned_driver_gets_403() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_status()
            .once()
            .return_once(|_, _, _, _| Err(OrdersServiceError::Forbidden));

        let res = TestClient::put(format!(
            "http://example.com/driver/orders/{uuid}/status"
        ))
        .add_header(ACTOR_UUID_HEADER, TEST_USER_UUID.to_string(), true)
        .add_header(ACTOR_ROLE_HEADER, "driver", true)
        .json(&json!({ "status": "picked_up" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_change_gets_409() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_status()
            .once()
            .return_once(|_, _, _, _| Err(OrdersServiceError::Conflict));

        let res = TestClient::put(format!(
            "http://example.com/driver/orders/{uuid}/status"
        ))
        .add_header(ACTOR_UUID_HEADER, TEST_USER_UUID.to_string(), true)
        .add_header(ACTOR_ROLE_HEADER, "driver", true)
        .json(&json!({ "status": "picked_up" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_vendor_role_gets_403() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders.expect_update_status().never();

        let res = TestClient::put(format!(
            "http://example.com/driver/orders/{uuid}/status"
        ))
        .add_header(ACTOR_UUID_HEADER, TEST_USER_UUID.to_string(), true)
        .add_header(ACTOR_ROLE_HEADER, "vendor", true)
        .json(&json!({ "status": "picked_up" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
