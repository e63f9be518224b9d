//! Orders service errors.

use std::num::TryFromIntError;

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error as ThisError;

use crate::domain::orders::{models::OrderStatus, transitions::TransitionError};

#[derive(Debug, ThisError)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("order is not active")]
    NotActive,

    #[error("order already has a driver assigned")]
    AlreadyAssigned,

    #[error("order must be in `ready` status to assign a driver (current status: {current})")]
    NotReady { current: OrderStatus },

    #[error("actor does not have permission for this order")]
    Forbidden,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("order was changed by another request")]
    Conflict,

    #[error("order already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("invalid monetary amount")]
    InvalidAmount(#[from] TryFromIntError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
