//! Role-scoped order status transitions.
//!
//! The single source of truth for which status changes each role may
//! perform. Pure lookup; handlers validate here before any write, and the
//! repository re-checks the current status inside the write itself.

use thiserror::Error;

use crate::domain::orders::models::{ActorRole, OrderStatus};

use OrderStatus::{
    Cancelled, Cart, Confirmed, DriverAssigned, Delivered, InTransit, PickedUp, Pending,
    Preparing, Ready,
};

/// Why a requested transition was rejected.
///
/// The two cases produce different user-facing messages: `NoTransitionsFrom`
/// means nothing can be done with the order in its current state by this
/// role, `NotReachable` means the role picked the wrong next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no status changes are possible from `{from}` for role `{role}`")]
    NoTransitionsFrom { role: ActorRole, from: OrderStatus },

    #[error("role `{role}` cannot move an order from `{from}` to `{to}`")]
    NotReachable {
        role: ActorRole,
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// Vendors accept, prepare and hand off, and may abort up to hand-off.
const VENDOR_TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
    (Pending, Confirmed),
    (Pending, Cancelled),
    (Confirmed, Preparing),
    (Confirmed, Cancelled),
    (Preparing, Ready),
    (Preparing, Cancelled),
];

/// Drivers carry the order from assignment to the customer's door.
const DRIVER_TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
    (DriverAssigned, PickedUp),
    (DriverAssigned, Cancelled),
    (PickedUp, InTransit),
    (PickedUp, Cancelled),
    (InTransit, Delivered),
];

/// Customers may only cancel, and only before the kitchen hands off.
const CUSTOMER_TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
    (Cart, Cancelled),
    (Pending, Cancelled),
    (Confirmed, Cancelled),
    (Preparing, Cancelled),
];

/// Decide whether `role` may move an order from `current` to `target`.
///
/// Admins may perform any transition (callers must still record an audit
/// entry for overrides).
///
/// # Errors
///
/// Returns a [`TransitionError`] classifying the rejection.
pub fn validate(
    current: OrderStatus,
    target: OrderStatus,
    role: ActorRole,
) -> Result<(), TransitionError> {
    let table = match role {
        ActorRole::Admin => return Ok(()),
        ActorRole::Vendor => VENDOR_TRANSITIONS,
        ActorRole::Driver => DRIVER_TRANSITIONS,
        ActorRole::Customer => CUSTOMER_TRANSITIONS,
    };

    if !table.iter().any(|(from, _)| *from == current) {
        return Err(TransitionError::NoTransitionsFrom {
            role,
            from: current,
        });
    }

    if table
        .iter()
        .any(|(from, to)| *from == current && *to == target)
    {
        Ok(())
    } else {
        Err(TransitionError::NotReachable {
            role,
            from: current,
            to: target,
        })
    }
}
