//! Orders service.
//!
//! One transaction per operation. Every status mutation is validated
//! against the role-scoped transition table first, then written with a
//! compare-and-set predicate on the observed status, and the audit row is
//! appended inside the same transaction. Post-commit hooks fire only after
//! a successful commit.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    database::Db,
    domain::orders::{
        errors::OrdersServiceError,
        events::{OrderEventsHook, OrderStatusChanged},
        models::{
            Actor, ActorRole, AdminOverride, NewOrder, Order, OrderDetails, OrderStatus,
            OrderUuid, StatusChange, UserUuid,
        },
        repositories::{PgOrderItemsRepository, PgOrdersRepository, PgStatusHistoryRepository},
        transitions,
    },
};

#[derive(Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    items: PgOrderItemsRepository,
    history: PgStatusHistoryRepository,
    hooks: Vec<Arc<dyn OrderEventsHook>>,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            items: PgOrderItemsRepository::new(),
            history: PgStatusHistoryRepository::new(),
            hooks: Vec::new(),
        }
    }

    /// Register a post-commit hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn OrderEventsHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    async fn fire_hooks(&self, event: OrderStatusChanged) {
        for hook in &self.hooks {
            hook.order_status_changed(event.clone()).await;
        }
    }

    /// Ownership check for mutating operations. Runs after the order has
    /// been fetched; unauthorized callers get `Forbidden` without any
    /// further detail about the order.
    async fn authorize_mutation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        actor: Actor,
        order: &Order,
    ) -> Result<(), OrdersServiceError> {
        match actor.role {
            ActorRole::Admin => Ok(()),
            ActorRole::Customer if order.customer == actor.user => Ok(()),
            ActorRole::Driver if order.driver == Some(actor.user) => Ok(()),
            ActorRole::Vendor => {
                let vendor = self.orders.restaurant_vendor(tx, order.restaurant).await?;

                if vendor == Some(actor.user) {
                    Ok(())
                } else {
                    Err(OrdersServiceError::Forbidden)
                }
            }
            ActorRole::Customer | ActorRole::Driver => Err(OrdersServiceError::Forbidden),
        }
    }

    fn validate_new_order(order: &NewOrder) -> Result<(), OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::MissingRequiredData);
        }

        let mut subtotal: u64 = 0;

        for item in &order.items {
            if item.quantity == 0 {
                return Err(OrdersServiceError::InvalidData);
            }

            let line_total = item
                .price_at_time
                .checked_mul(u64::from(item.quantity))
                .ok_or(OrdersServiceError::InvalidData)?;

            if line_total != item.line_total {
                return Err(OrdersServiceError::InvalidData);
            }

            subtotal = subtotal
                .checked_add(line_total)
                .ok_or(OrdersServiceError::InvalidData)?;
        }

        if subtotal != order.subtotal {
            return Err(OrdersServiceError::InvalidData);
        }

        let total = order
            .subtotal
            .checked_add(order.tax)
            .and_then(|sum| sum.checked_add(order.delivery_fee))
            .and_then(|sum| sum.checked_sub(order.discount))
            .ok_or(OrdersServiceError::InvalidData)?;

        if total != order.total {
            return Err(OrdersServiceError::InvalidData);
        }

        Ok(())
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrdersServiceError> {
        Self::validate_new_order(&order)?;

        let mut tx = self.db.begin_transaction().await?;

        let created = self.orders.create_order(&mut tx, &order).await?;

        for item in &order.items {
            self.items
                .create_order_item(&mut tx, created.uuid, item)
                .await?;
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn get_order(
        &self,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders.get_order(&mut tx, order).await?;

        match actor.role {
            ActorRole::Admin => {}
            ActorRole::Customer => {
                if order.customer != actor.user {
                    return Err(OrdersServiceError::Forbidden);
                }
            }
            ActorRole::Driver => {
                // A driver may inspect its own order, or any order still in
                // the assignment feed.
                if order.driver != Some(actor.user) && order.status != OrderStatus::Ready {
                    return Err(OrdersServiceError::Forbidden);
                }
            }
            ActorRole::Vendor => {
                let vendor = self
                    .orders
                    .restaurant_vendor(&mut tx, order.restaurant)
                    .await?;

                if vendor != Some(actor.user) {
                    return Err(OrdersServiceError::Forbidden);
                }
            }
        }

        let items = self.items.get_order_items(&mut tx, order.uuid).await?;
        let history = self.history.list_for_order(&mut tx, order.uuid).await?;

        tx.commit().await?;

        Ok(OrderDetails {
            order,
            items,
            history,
        })
    }

    async fn available_orders(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self
            .orders
            .list_available_orders(&mut tx, limit, offset)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn assign_driver(
        &self,
        order: OrderUuid,
        driver: UserUuid,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let Some(assigned) = self.orders.assign_driver(&mut tx, order, driver).await? else {
            // The conditional write matched nothing. Re-read to tell the
            // caller why; a row that is now assigned means another driver
            // won the race.
            let current = self.orders.get_order(&mut tx, order).await?;

            if !current.is_active {
                return Err(OrdersServiceError::NotActive);
            }

            if current.driver.is_some() {
                return Err(OrdersServiceError::AlreadyAssigned);
            }

            if current.status != OrderStatus::Ready {
                return Err(OrdersServiceError::NotReady {
                    current: current.status,
                });
            }

            return Err(OrdersServiceError::Conflict);
        };

        self.history
            .append(
                &mut tx,
                assigned.uuid,
                Some(driver),
                Some(OrderStatus::Ready),
                OrderStatus::DriverAssigned,
                Some("driver self-assigned"),
            )
            .await?;

        tx.commit().await?;

        self.fire_hooks(OrderStatusChanged {
            order: assigned.uuid,
            from: OrderStatus::Ready,
            to: OrderStatus::DriverAssigned,
            actor: Some(driver),
            driver: Some(driver),
        })
        .await;

        Ok(assigned)
    }

    async fn update_status(
        &self,
        actor: Actor,
        order: OrderUuid,
        target: OrderStatus,
        notes: Option<String>,
    ) -> Result<StatusChange, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders.get_order(&mut tx, order).await?;

        self.authorize_mutation(&mut tx, actor, &current).await?;

        if !current.is_active {
            return Err(OrdersServiceError::NotActive);
        }

        transitions::validate(current.status, target, actor.role)?;

        let rows_affected = self
            .orders
            .update_status(&mut tx, order, current.status, target)
            .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::Conflict);
        }

        self.history
            .append(
                &mut tx,
                order,
                Some(actor.user),
                Some(current.status),
                target,
                notes.as_deref(),
            )
            .await?;

        tx.commit().await?;

        self.fire_hooks(OrderStatusChanged {
            order,
            from: current.status,
            to: target,
            actor: Some(actor.user),
            driver: if target.carries_driver() {
                current.driver
            } else {
                None
            },
        })
        .await;

        Ok(StatusChange {
            order,
            from: current.status,
            to: target,
        })
    }

    async fn cancel_order(
        &self,
        customer: UserUuid,
        order: OrderUuid,
        reason: String,
    ) -> Result<StatusChange, OrdersServiceError> {
        if reason.trim().is_empty() {
            return Err(OrdersServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders.get_order(&mut tx, order).await?;

        if current.customer != customer {
            return Err(OrdersServiceError::Forbidden);
        }

        if !current.is_active {
            return Err(OrdersServiceError::NotActive);
        }

        transitions::validate(current.status, OrderStatus::Cancelled, ActorRole::Customer)?;

        let rows_affected = self
            .orders
            .cancel_order(&mut tx, order, current.status, &reason)
            .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::Conflict);
        }

        self.history
            .append(
                &mut tx,
                order,
                Some(customer),
                Some(current.status),
                OrderStatus::Cancelled,
                Some(&reason),
            )
            .await?;

        tx.commit().await?;

        self.fire_hooks(OrderStatusChanged {
            order,
            from: current.status,
            to: OrderStatus::Cancelled,
            actor: Some(customer),
            driver: None,
        })
        .await;

        Ok(StatusChange {
            order,
            from: current.status,
            to: OrderStatus::Cancelled,
        })
    }

    async fn admin_override(
        &self,
        admin: UserUuid,
        order: OrderUuid,
        update: AdminOverride,
    ) -> Result<StatusChange, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders.get_order(&mut tx, order).await?;

        if update.status.carries_driver() && update.driver.is_none() && current.driver.is_none() {
            // Nobody to carry the order on a driver-carried status.
            return Err(OrdersServiceError::MissingRequiredData);
        }

        let Some(updated) = self
            .orders
            .admin_update_order(&mut tx, order, current.status, update.status, update.driver)
            .await?
        else {
            return Err(OrdersServiceError::Conflict);
        };

        let notes = match update.notes {
            Some(notes) => format!("admin override: {notes}"),
            None => "admin override".to_string(),
        };

        self.history
            .append(
                &mut tx,
                order,
                Some(admin),
                Some(current.status),
                update.status,
                Some(&notes),
            )
            .await?;

        tx.commit().await?;

        self.fire_hooks(OrderStatusChanged {
            order,
            from: current.status,
            to: update.status,
            actor: Some(admin),
            driver: updated.driver,
        })
        .await;

        Ok(StatusChange {
            order,
            from: current.status,
            to: update.status,
        })
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Create an order in `pending` with its snapshotted items.
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrdersServiceError>;

    /// Retrieve an order with items and audit trail, scoped to the actor.
    async fn get_order(
        &self,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError>;

    /// Unassigned active orders a driver could claim, ready-first.
    async fn available_orders(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    /// Atomically claim a `ready`, unassigned order for a driver.
    async fn assign_driver(
        &self,
        order: OrderUuid,
        driver: UserUuid,
    ) -> Result<Order, OrdersServiceError>;

    /// Move an order to `target` on behalf of `actor`, appending an audit
    /// row in the same transaction.
    async fn update_status(
        &self,
        actor: Actor,
        order: OrderUuid,
        target: OrderStatus,
        notes: Option<String>,
    ) -> Result<StatusChange, OrdersServiceError>;

    /// Customer cancellation with a mandatory reason.
    async fn cancel_order(
        &self,
        customer: UserUuid,
        order: OrderUuid,
        reason: String,
    ) -> Result<StatusChange, OrdersServiceError>;

    /// Admin override to any status, with a mandatory audit entry.
    async fn admin_override(
        &self,
        admin: UserUuid,
        order: OrderUuid,
        update: AdminOverride,
    ) -> Result<StatusChange, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use testresult::TestResult;

    use crate::{
        database::Db,
        domain::orders::{
            events::MockOrderEventsHook,
            models::{NewOrderItem, OrderItemUuid},
            transitions::TransitionError,
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn create_order_starts_pending_with_items() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = UserUuid::new();

        let order = ctx.place_order(customer).await?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer, customer);
        assert!(order.driver.is_none());
        assert!(order.placed_at.is_some());
        assert!(order.is_active);

        let details = ctx
            .orders
            .get_order(ctx.admin_actor(), order.uuid)
            .await?;

        assert_eq!(details.items.len(), 2);
        assert!(details.history.is_empty(), "creation is not a transition");

        Ok(())
    }

    #[tokio::test]
    async fn create_order_rejects_total_mismatch() {
        let ctx = TestContext::new().await;

        let mut order = ctx.sample_order(UserUuid::new());
        order.total += 1;

        let result = ctx.orders.create_order(order).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_order_rejects_empty_items() {
        let ctx = TestContext::new().await;

        let mut order = ctx.sample_order(UserUuid::new());
        order.items.clear();

        let result = ctx.orders.create_order(order).await;

        assert!(
            matches!(result, Err(OrdersServiceError::MissingRequiredData)),
            "expected MissingRequiredData, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_order_rejects_line_total_mismatch() {
        let ctx = TestContext::new().await;

        let mut order = ctx.sample_order(UserUuid::new());
        order.items.push(NewOrderItem {
            uuid: OrderItemUuid::new(),
            name: "Garlic bread".to_string(),
            description: None,
            price_at_time: 450,
            quantity: 2,
            customizations: serde_json::json!({}),
            line_total: 450,
        });

        let result = ctx.orders.create_order(order).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_order_unknown_restaurant_rejected() {
        let ctx = TestContext::new().await;

        let mut order = ctx.sample_order(UserUuid::new());
        order.restaurant = crate::domain::orders::models::RestaurantUuid::new();

        let result = ctx.orders.create_order(order).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );
    }

    #[tokio::test]
    async fn vendor_confirms_pending_order() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;

        let change = ctx
            .orders
            .update_status(
                ctx.vendor_actor(),
                order.uuid,
                OrderStatus::Confirmed,
                Some("ETA 20 minutes".to_string()),
            )
            .await?;

        assert_eq!(change.from, OrderStatus::Pending);
        assert_eq!(change.to, OrderStatus::Confirmed);

        let details = ctx.orders.get_order(ctx.admin_actor(), order.uuid).await?;

        assert_eq!(details.order.status, OrderStatus::Confirmed);
        assert!(details.order.confirmed_at.is_some());
        assert_eq!(details.history.len(), 1);

        let entry = &details.history[0];

        assert_eq!(entry.from_status, Some(OrderStatus::Pending));
        assert_eq!(entry.to_status, OrderStatus::Confirmed);
        assert_eq!(entry.user, Some(ctx.vendor));
        assert_eq!(entry.notes.as_deref(), Some("ETA 20 minutes"));

        Ok(())
    }

    #[tokio::test]
    async fn vendor_cannot_skip_preparing() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;

        let result = ctx
            .orders
            .update_status(ctx.vendor_actor(), order.uuid, OrderStatus::Ready, None)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Transition(TransitionError::NotReachable {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Ready,
                    ..
                }))
            ),
            "expected NotReachable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn other_vendor_is_forbidden() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;

        let impostor = Actor {
            user: UserUuid::new(),
            role: ActorRole::Vendor,
        };

        let result = ctx
            .orders
            .update_status(impostor, order.uuid, OrderStatus::Confirmed, None)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unassigned_driver_cannot_update_status() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;

        let driver = Actor {
            user: UserUuid::new(),
            role: ActorRole::Driver,
        };

        let result = ctx
            .orders
            .update_status(driver, order, OrderStatus::PickedUp, None)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn assign_driver_success_appends_history() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;
        let driver = UserUuid::new();

        let assigned = ctx.orders.assign_driver(order, driver).await?;

        assert_eq!(assigned.status, OrderStatus::DriverAssigned);
        assert_eq!(assigned.driver, Some(driver));

        let details = ctx.orders.get_order(ctx.admin_actor(), order).await?;
        let last = details.history.last().expect("history should not be empty");

        assert_eq!(last.from_status, Some(OrderStatus::Ready));
        assert_eq!(last.to_status, OrderStatus::DriverAssigned);
        assert_eq!(last.user, Some(driver));
        assert_eq!(last.notes.as_deref(), Some("driver self-assigned"));

        Ok(())
    }

    #[tokio::test]
    async fn assign_driver_requires_ready_status() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;

        let result = ctx.orders.assign_driver(order.uuid, UserUuid::new()).await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::NotReady {
                    current: OrderStatus::Pending,
                })
            ),
            "expected NotReady, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn assign_driver_unknown_order_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .assign_driver(OrderUuid::new(), UserUuid::new())
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn assign_driver_loser_gets_already_assigned() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;

        ctx.orders.assign_driver(order, UserUuid::new()).await?;

        let result = ctx.orders.assign_driver(order, UserUuid::new()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::AlreadyAssigned)),
            "expected AlreadyAssigned, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn assign_same_driver_twice_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;
        let driver = UserUuid::new();

        ctx.orders.assign_driver(order, driver).await?;

        // The predicate requires an unassigned order, so repeating the
        // claim is a conflict rather than a silent success.
        let result = ctx.orders.assign_driver(order, driver).await;

        assert!(
            matches!(result, Err(OrdersServiceError::AlreadyAssigned)),
            "expected AlreadyAssigned, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn assign_driver_inactive_order_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;

        ctx.deactivate_order(order).await;

        let result = ctx.orders.assign_driver(order, UserUuid::new()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotActive)),
            "expected NotActive, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_assigns_have_exactly_one_winner() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;

        let drivers: Vec<UserUuid> = (0..6).map(|_| UserUuid::new()).collect();

        let results = join_all(drivers.iter().map(|driver| {
            let orders = ctx.orders.clone();
            let driver = *driver;

            async move { orders.assign_driver(order, driver).await }
        }))
        .await;

        let winners = results.iter().filter(|result| result.is_ok()).count();

        assert_eq!(winners, 1, "exactly one driver must win the race");

        for result in results.iter().filter(|result| result.is_err()) {
            assert!(
                matches!(result, Err(OrdersServiceError::AlreadyAssigned)),
                "losers must see AlreadyAssigned, got {result:?}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn driver_progression_keeps_history_in_sequence() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;
        let driver = UserUuid::new();

        ctx.orders.assign_driver(order, driver).await?;

        let driver_actor = Actor {
            user: driver,
            role: ActorRole::Driver,
        };

        for target in [
            OrderStatus::PickedUp,
            OrderStatus::InTransit,
            OrderStatus::Delivered,
        ] {
            ctx.orders
                .update_status(driver_actor, order, target, None)
                .await?;
        }

        let details = ctx.orders.get_order(ctx.admin_actor(), order).await?;

        assert_eq!(details.order.status, OrderStatus::Delivered);
        assert!(details.order.delivered_at.is_some());
        assert_eq!(details.order.driver, Some(driver));

        let statuses: Vec<(Option<OrderStatus>, OrderStatus)> = details
            .history
            .iter()
            .map(|entry| (entry.from_status, entry.to_status))
            .collect();

        assert_eq!(
            statuses,
            vec![
                (Some(OrderStatus::Pending), OrderStatus::Confirmed),
                (Some(OrderStatus::Confirmed), OrderStatus::Preparing),
                (Some(OrderStatus::Preparing), OrderStatus::Ready),
                (Some(OrderStatus::Ready), OrderStatus::DriverAssigned),
                (Some(OrderStatus::DriverAssigned), OrderStatus::PickedUp),
                (Some(OrderStatus::PickedUp), OrderStatus::InTransit),
                (Some(OrderStatus::InTransit), OrderStatus::Delivered),
            ],
            "history must mirror the committed sequence"
        );

        Ok(())
    }

    #[tokio::test]
    async fn driver_cancel_releases_the_driver() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;
        let driver = UserUuid::new();

        ctx.orders.assign_driver(order, driver).await?;

        let driver_actor = Actor {
            user: driver,
            role: ActorRole::Driver,
        };

        ctx.orders
            .update_status(driver_actor, order, OrderStatus::PickedUp, None)
            .await?;

        ctx.orders
            .update_status(
                driver_actor,
                order,
                OrderStatus::Cancelled,
                Some("customer unreachable".to_string()),
            )
            .await?;

        let details = ctx.orders.get_order(ctx.admin_actor(), order).await?;

        assert_eq!(details.order.status, OrderStatus::Cancelled);
        assert!(details.order.driver.is_none(), "cancel releases the driver");
        assert!(details.order.cancelled_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn customer_cancel_records_reason() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = UserUuid::new();
        let order = ctx.place_order(customer).await?;

        let change = ctx
            .orders
            .cancel_order(customer, order.uuid, "ordered by mistake".to_string())
            .await?;

        assert_eq!(change.from, OrderStatus::Pending);
        assert_eq!(change.to, OrderStatus::Cancelled);

        let details = ctx.orders.get_order(ctx.admin_actor(), order.uuid).await?;

        assert_eq!(details.order.status, OrderStatus::Cancelled);
        assert_eq!(
            details.order.cancellation_reason.as_deref(),
            Some("ordered by mistake")
        );

        let last = details.history.last().expect("history should not be empty");

        assert_eq!(last.user, Some(customer));
        assert_eq!(last.to_status, OrderStatus::Cancelled);

        Ok(())
    }

    #[tokio::test]
    async fn customer_cannot_cancel_after_pickup() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = UserUuid::new();
        let order = ctx.ready_order(customer).await?;
        let driver = UserUuid::new();

        ctx.orders.assign_driver(order, driver).await?;
        ctx.orders
            .update_status(
                Actor {
                    user: driver,
                    role: ActorRole::Driver,
                },
                order,
                OrderStatus::PickedUp,
                None,
            )
            .await?;

        let result = ctx
            .orders
            .cancel_order(customer, order, "changed my mind".to_string())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Transition(
                    TransitionError::NoTransitionsFrom {
                        from: OrderStatus::PickedUp,
                        ..
                    }
                ))
            ),
            "expected NoTransitionsFrom, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn customer_cannot_cancel_someone_elses_order() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;

        let result = ctx
            .orders
            .cancel_order(UserUuid::new(), order.uuid, "not mine".to_string())
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn cancel_requires_a_reason() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = UserUuid::new();
        let order = ctx.place_order(customer).await?;

        let result = ctx
            .orders
            .cancel_order(customer, order.uuid, "   ".to_string())
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::MissingRequiredData)),
            "expected MissingRequiredData, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn admin_override_bypasses_the_table_with_audit() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;
        let admin = UserUuid::new();

        // pending -> preparing is not reachable for any non-admin role.
        let change = ctx
            .orders
            .admin_override(
                admin,
                order.uuid,
                AdminOverride {
                    status: OrderStatus::Preparing,
                    driver: None,
                    notes: Some("support escalation".to_string()),
                },
            )
            .await?;

        assert_eq!(change.from, OrderStatus::Pending);
        assert_eq!(change.to, OrderStatus::Preparing);

        let details = ctx.orders.get_order(ctx.admin_actor(), order.uuid).await?;
        let last = details.history.last().expect("history should not be empty");

        assert_eq!(last.user, Some(admin));
        assert_eq!(
            last.notes.as_deref(),
            Some("admin override: support escalation")
        );

        Ok(())
    }

    #[tokio::test]
    async fn admin_override_to_driver_status_requires_a_driver() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;

        let result = ctx
            .orders
            .admin_override(
                UserUuid::new(),
                order.uuid,
                AdminOverride {
                    status: OrderStatus::PickedUp,
                    driver: None,
                    notes: None,
                },
            )
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::MissingRequiredData)),
            "expected MissingRequiredData, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn admin_override_can_assign_a_driver_directly() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;
        let driver = UserUuid::new();

        ctx.orders
            .admin_override(
                UserUuid::new(),
                order,
                AdminOverride {
                    status: OrderStatus::DriverAssigned,
                    driver: Some(driver),
                    notes: None,
                },
            )
            .await?;

        let details = ctx.orders.get_order(ctx.admin_actor(), order).await?;

        assert_eq!(details.order.status, OrderStatus::DriverAssigned);
        assert_eq!(details.order.driver, Some(driver));

        Ok(())
    }

    #[tokio::test]
    async fn available_orders_prioritise_ready_and_exclude_assigned() -> TestResult {
        let ctx = TestContext::new().await;

        let confirmed = ctx.place_order(UserUuid::new()).await?;
        ctx.orders
            .update_status(
                ctx.vendor_actor(),
                confirmed.uuid,
                OrderStatus::Confirmed,
                None,
            )
            .await?;

        let ready = ctx.ready_order(UserUuid::new()).await?;

        let assigned = ctx.ready_order(UserUuid::new()).await?;
        ctx.orders.assign_driver(assigned, UserUuid::new()).await?;

        let pending = ctx.place_order(UserUuid::new()).await?;

        let available = ctx.orders.available_orders(10, 0).await?;
        let uuids: Vec<OrderUuid> = available.iter().map(|order| order.uuid).collect();

        assert_eq!(uuids.first(), Some(&ready), "ready orders come first");
        assert!(uuids.contains(&confirmed.uuid));
        assert!(!uuids.contains(&assigned), "assigned orders are hidden");
        assert!(!uuids.contains(&pending.uuid), "pending orders are hidden");

        Ok(())
    }

    #[tokio::test]
    async fn get_order_is_scoped_to_the_owning_customer() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = UserUuid::new();
        let order = ctx.place_order(customer).await?;

        let owner = Actor {
            user: customer,
            role: ActorRole::Customer,
        };

        assert!(ctx.orders.get_order(owner, order.uuid).await.is_ok());

        let stranger = Actor {
            user: UserUuid::new(),
            role: ActorRole::Customer,
        };

        let result = ctx.orders.get_order(stranger, order.uuid).await;

        assert!(
            matches!(result, Err(OrdersServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn driver_may_view_any_ready_order() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.ready_order(UserUuid::new()).await?;

        let browsing_driver = Actor {
            user: UserUuid::new(),
            role: ActorRole::Driver,
        };

        let details = ctx.orders.get_order(browsing_driver, order).await?;

        assert_eq!(details.order.status, OrderStatus::Ready);

        Ok(())
    }

    #[tokio::test]
    async fn hooks_fire_after_commit() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;
        let vendor = ctx.vendor;

        let mut hook = MockOrderEventsHook::new();

        hook.expect_order_status_changed()
            .once()
            .withf(move |event| {
                event.from == OrderStatus::Pending
                    && event.to == OrderStatus::Confirmed
                    && event.actor == Some(vendor)
            })
            .return_const(());

        let service = PgOrdersService::new(Db::new(ctx.db.pool().clone()))
            .with_hook(std::sync::Arc::new(hook));

        service
            .update_status(ctx.vendor_actor(), order.uuid, OrderStatus::Confirmed, None)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn full_lifecycle_scenario() -> TestResult {
        let ctx = TestContext::new().await;
        let order = ctx.place_order(UserUuid::new()).await?;

        // Vendor accepts.
        ctx.orders
            .update_status(ctx.vendor_actor(), order.uuid, OrderStatus::Confirmed, None)
            .await?;

        // Vendor tries to skip straight to ready.
        let skipped = ctx
            .orders
            .update_status(ctx.vendor_actor(), order.uuid, OrderStatus::Ready, None)
            .await;

        assert!(
            matches!(
                skipped,
                Err(OrdersServiceError::Transition(TransitionError::NotReachable { .. }))
            ),
            "expected NotReachable, got {skipped:?}"
        );

        // A driver tries to claim before the order is ready.
        let premature = ctx.orders.assign_driver(order.uuid, UserUuid::new()).await;

        assert!(
            matches!(
                premature,
                Err(OrdersServiceError::NotReady {
                    current: OrderStatus::Confirmed,
                })
            ),
            "expected NotReady, got {premature:?}"
        );

        // Vendor finishes preparation.
        ctx.orders
            .update_status(ctx.vendor_actor(), order.uuid, OrderStatus::Preparing, None)
            .await?;
        ctx.orders
            .update_status(ctx.vendor_actor(), order.uuid, OrderStatus::Ready, None)
            .await?;

        // First driver wins the claim, the second sees the conflict.
        let winner = UserUuid::new();

        let assigned = ctx.orders.assign_driver(order.uuid, winner).await?;

        assert_eq!(assigned.status, OrderStatus::DriverAssigned);
        assert_eq!(assigned.driver, Some(winner));

        let loser = ctx.orders.assign_driver(order.uuid, UserUuid::new()).await;

        assert!(
            matches!(loser, Err(OrdersServiceError::AlreadyAssigned)),
            "expected AlreadyAssigned, got {loser:?}"
        );

        Ok(())
    }
}
