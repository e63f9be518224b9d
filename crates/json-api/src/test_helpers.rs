//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use dispatch_app::{
    context::AppContext,
    domain::orders::{
        MockOrdersService,
        models::{Order, OrderStatus, OrderUuid, RestaurantUuid, UserUuid},
    },
};

use crate::{auth, state::State};

pub(crate) use crate::auth::middleware::{ACTOR_ROLE_HEADER, ACTOR_UUID_HEADER};

/// Identity the tests assert with through the gateway headers.
pub(crate) const TEST_USER_UUID: Uuid = Uuid::nil();

pub(crate) fn state_with_orders(orders: MockOrdersService) -> Arc<State> {
    Arc::new(State::new(AppContext {
        orders: Arc::new(orders),
    }))
}

/// A service with the real identity middleware in front of `route`; tests
/// authenticate by sending the gateway headers.
pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_orders(orders)))
            .hoop(auth::middleware::handler)
            .push(route),
    )
}

/// A plausible order for mock return values.
pub(crate) fn make_order(uuid: OrderUuid) -> Order {
    let now = Timestamp::now();

    Order {
        uuid,
        customer: UserUuid::from_uuid(TEST_USER_UUID),
        restaurant: RestaurantUuid::new(),
        driver: None,
        delivery_address: None,
        status: OrderStatus::Pending,
        subtotal: 2900,
        tax: 246,
        delivery_fee: 500,
        discount: 0,
        total: 3646,
        special_instructions: None,
        cancellation_reason: None,
        placed_at: Some(now),
        confirmed_at: None,
        ready_at: None,
        delivered_at: None,
        cancelled_at: None,
        estimated_delivery_at: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
