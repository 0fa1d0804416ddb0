use crate::{
    extractor::AuthorizedUser,
    model::order::{CreateOrderRequest, OrderResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::id::OrderId;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn create_order(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    req.validate(&())?;

    let event = req.into_event(
        user.id(),
        &registry.booking_config(),
        Utc::now(),
        &mut rand::thread_rng(),
    );

    registry
        .order_repository()
        .create(event)
        .await
        .map(|order| (StatusCode::CREATED, Json(order.into())))
}

pub async fn show_order(
    user: AuthorizedUser,
    Path(order_id): Path<OrderId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<OrderResponse>> {
    let order = registry
        .order_repository()
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("注文（{order_id}）が見つかりませんでした。")))?;

    if order.user_id != user.id() && !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    Ok(Json(order.into()))
}
