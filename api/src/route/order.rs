use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::order::{create_order, show_order};

pub fn build_order_routers() -> Router<AppRegistry> {
    let orders_routers = Router::new()
        .route("/", post(create_order))
        .route("/:order_id", get(show_order));

    Router::new().nest("/orders", orders_routers)
}
