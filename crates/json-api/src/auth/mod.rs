//! Gateway-injected identity.

pub(crate) mod middleware;

use salvo::http::StatusError;

use dispatch_app::domain::orders::models::{Actor, ActorRole};

/// Reject callers whose asserted role does not match the surface.
pub(crate) fn require_role(actor: &Actor, role: ActorRole) -> Result<(), StatusError> {
    if actor.role == role {
        Ok(())
    } else {
        Err(StatusError::forbidden().brief(format!("This endpoint requires the `{role}` role")))
    }
}
