use super::{
    booking::build_booking_routers, conversation::build_conversation_routers,
    health::build_health_check_routers, order::build_order_routers,
};
use axum::Router;
use registry::AppRegistry;

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_health_check_routers())
        .merge(build_booking_routers())
        .merge(build_conversation_routers())
        .merge(build_order_routers());
    Router::new().nest("/api/v1", router)
}
