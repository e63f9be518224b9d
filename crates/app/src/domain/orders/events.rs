//! Post-commit order events.
//!
//! Downstream side effects (customer/vendor/driver notifications) hang off
//! an explicit hook list instead of inline best-effort calls. Hooks run
//! only after the transaction commits and can never fail the committed
//! operation.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::orders::models::{OrderStatus, OrderUuid, UserUuid};

/// A committed status change, as seen by post-commit hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusChanged {
    pub order: OrderUuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Acting user; `None` for system-attributed changes.
    pub actor: Option<UserUuid>,
    /// Driver on the order after the change, if any.
    pub driver: Option<UserUuid>,
}

/// Observer notified after each committed status change.
#[automock]
#[async_trait]
pub trait OrderEventsHook: Send + Sync {
    async fn order_status_changed(&self, event: OrderStatusChanged);
}

/// Hook that records committed status changes in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventsHook;

#[async_trait]
impl OrderEventsHook for LoggingEventsHook {
    async fn order_status_changed(&self, event: OrderStatusChanged) {
        tracing::info!(
            order_uuid = %event.order,
            from = %event.from,
            to = %event.to,
            actor = event.actor.map(|user| user.to_string()),
            "order status changed"
        );
    }
}
