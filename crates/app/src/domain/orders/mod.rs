//! Order lifecycle domain: models, role-scoped status transitions, the
//! orders service and its Postgres repositories.

pub mod errors;
pub mod events;
pub mod models;
mod repositories;
pub mod service;
pub mod transitions;

pub use errors::OrdersServiceError;
pub use service::{MockOrdersService, OrdersService, PgOrdersService};
