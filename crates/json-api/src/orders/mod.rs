//! Order endpoints.

pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod requests;

use salvo::Router;

/// Role-scoped order routes, mounted under `/api`.
pub(crate) fn router() -> Router {
    Router::new()
        .push(Router::with_path("orders/{order}").get(handlers::get::handler))
        .push(
            Router::with_path("customer/orders")
                .post(handlers::create::handler)
                .push(Router::with_path("{order}/cancel").post(handlers::cancel::handler)),
        )
        .push(
            Router::with_path("driver/orders")
                .push(Router::with_path("available").get(handlers::available::handler))
                .push(
                    Router::with_path("{order}")
                        .push(Router::with_path("assign").post(handlers::assign::handler))
                        .push(Router::with_path("status").put(handlers::driver_status::handler)),
                ),
        )
        .push(
            Router::with_path("vendor/orders/{order}/status").put(handlers::vendor_status::handler),
        )
        .push(Router::with_path("admin/orders/{order}").put(handlers::admin_update::handler))
}
