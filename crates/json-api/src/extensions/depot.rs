//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use dispatch_app::domain::orders::models::Actor;

const ACTOR_KEY: &str = "dispatch.actor";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    /// Store the authenticated actor for downstream handlers.
    fn insert_actor(&mut self, actor: Actor);

    /// The authenticated actor, or 401 when the middleware did not run.
    fn actor_or_401(&self) -> Result<Actor, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_actor(&mut self, actor: Actor) {
        self.insert(ACTOR_KEY, actor);
    }

    fn actor_or_401(&self) -> Result<Actor, StatusError> {
        self.get::<Actor>(ACTOR_KEY)
            .copied()
            .map_err(|_ignored| StatusError::unauthorized().brief("Missing actor identity"))
    }
}
