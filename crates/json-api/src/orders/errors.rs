//! Order Errors

use salvo::http::StatusError;
use tracing::error;

use dispatch_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::NotFound => StatusError::not_found(),
        OrdersServiceError::Forbidden => {
            StatusError::forbidden().brief("You don't have permission for this order")
        }
        OrdersServiceError::AlreadyAssigned => {
            StatusError::conflict().brief("This order has already been assigned to another driver")
        }
        OrdersServiceError::Conflict => StatusError::conflict()
            .brief("The order was changed by another request; refresh and try again"),
        OrdersServiceError::NotReady { current } => StatusError::bad_request().brief(format!(
            "Order must be in `ready` status to assign a driver (current status: {current})"
        )),
        OrdersServiceError::NotActive => StatusError::bad_request().brief("Order is not active"),
        OrdersServiceError::Transition(source) => {
            StatusError::bad_request().brief(source.to_string())
        }
        OrdersServiceError::AlreadyExists => StatusError::conflict().brief("Order already exists"),
        OrdersServiceError::InvalidReference => {
            StatusError::bad_request().brief("Referenced resource does not exist")
        }
        OrdersServiceError::MissingRequiredData => {
            StatusError::bad_request().brief("Missing required data")
        }
        OrdersServiceError::InvalidData | OrdersServiceError::InvalidAmount(_) => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::Sql(source) => {
            error!("order operation failed: {source}");

            StatusError::internal_server_error()
        }
    }
}
