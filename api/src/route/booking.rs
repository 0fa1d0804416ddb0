use axum::{
    routing::{get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::booking::{
    accept_booking, confirm_payment, create_booking, end_booking, refund_booking, show_booking,
    show_my_bookings, show_stylist_bookings,
};

pub fn build_booking_routers() -> Router<AppRegistry> {
    let bookings_routers = Router::new()
        .route("/", post(create_booking))
        .route("/", get(show_my_bookings))
        .route("/stylist", get(show_stylist_bookings))
        .route("/:booking_id", get(show_booking))
        .route("/:booking_id/payment", put(confirm_payment))
        .route("/:booking_id/accept", put(accept_booking))
        .route("/:booking_id/end", put(end_booking))
        .route("/:booking_id/refund", put(refund_booking));

    Router::new().nest("/bookings", bookings_routers)
}
