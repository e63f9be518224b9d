//! Actor identity middleware.
//!
//! The upstream gateway authenticates callers and asserts their identity
//! through trusted headers; this middleware parses them into an [`Actor`]
//! for handlers. Requests without a well-formed identity never reach a
//! handler.

use salvo::prelude::*;
use uuid::Uuid;

use dispatch_app::domain::orders::models::{Actor, ActorRole};

use crate::extensions::*;

/// Gateway header carrying the authenticated user's UUID.
pub(crate) const ACTOR_UUID_HEADER: &str = "x-actor-uuid";

/// Gateway header carrying the authenticated user's role.
pub(crate) const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(actor) = extract_actor(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid actor identity headers"));

        return;
    };

    depot.insert_actor(actor);

    ctrl.call_next(req, depot, res).await;
}

fn extract_actor(req: &Request) -> Option<Actor> {
    let user = req
        .headers()
        .get(ACTOR_UUID_HEADER)?
        .to_str()
        .ok()?
        .parse::<Uuid>()
        .ok()?;

    let role = req
        .headers()
        .get(ACTOR_ROLE_HEADER)?
        .to_str()
        .ok()?
        .parse::<ActorRole>()
        .ok()?;

    Some(Actor {
        user: user.into(),
        role,
    })
}
