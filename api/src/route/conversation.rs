use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::conversation::{post_message, show_conversation, show_my_conversations};

pub fn build_conversation_routers() -> Router<AppRegistry> {
    let conversations_routers = Router::new()
        .route("/", get(show_my_conversations))
        .route("/:conversation_id", get(show_conversation))
        .route("/:conversation_id/messages", post(post_message));

    Router::new().nest("/conversations", conversations_routers)
}
