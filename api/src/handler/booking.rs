use crate::{
    extractor::AuthorizedUser,
    model::booking::{
        BookingClosedResponse, BookingResponse, BookingsResponse, CreateBookingRequest,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::{
    booking::{event::ConfirmBookingPayment, Booking, BookingAction},
    conversation::{event::CloseConversation, CloseReason},
    id::BookingId,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn create_booking(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    req.validate(&())?;

    let event = req.into_event(
        user.id(),
        &registry.booking_config(),
        Utc::now(),
        &mut rand::thread_rng(),
    )?;

    registry
        .booking_repository()
        .create(event)
        .await
        .map(|booking| (StatusCode::CREATED, Json(booking.into())))
}

pub async fn show_my_bookings(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    registry
        .booking_repository()
        .find_by_customer_id(user.id())
        .await
        .map(BookingsResponse::from)
        .map(Json)
}

pub async fn show_stylist_bookings(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    if !user.is_stylist() {
        return Err(AppError::ForbiddenOperation);
    }

    registry
        .booking_repository()
        .find_active_by_stylist_user_id(user.id())
        .await
        .map(BookingsResponse::from)
        .map(Json)
}

pub async fn show_booking(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    authorized_booking(&registry, &user, booking_id, BookingAction::View)
        .await
        .map(|booking| Json(booking.into()))
}

// 決済サービスからの通知の代わりに管理者が支払いを確認する
pub async fn confirm_payment(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    authorized_booking(&registry, &user, booking_id, BookingAction::ConfirmPayment).await?;

    registry
        .booking_repository()
        .confirm_payment(ConfirmBookingPayment::new(booking_id, Utc::now()))
        .await
        .map(|booking| Json(booking.into()))
}

pub async fn accept_booking(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    authorized_booking(&registry, &user, booking_id, BookingAction::Accept).await?;

    registry
        .booking_repository()
        .accept(booking_id)
        .await
        .map(|booking| Json(booking.into()))
}

pub async fn end_booking(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingClosedResponse>> {
    authorized_booking(&registry, &user, booking_id, BookingAction::End).await?;
    close_booking(&registry, booking_id, CloseReason::Manual).await
}

pub async fn refund_booking(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingClosedResponse>> {
    authorized_booking(&registry, &user, booking_id, BookingAction::Refund).await?;
    close_booking(&registry, booking_id, CloseReason::Refund).await
}

async fn close_booking(
    registry: &AppRegistry,
    booking_id: BookingId,
    reason: CloseReason,
) -> AppResult<Json<BookingClosedResponse>> {
    registry
        .conversation_repository()
        .close_conversation(CloseConversation::new(booking_id, reason, Utc::now()))
        .await
        .map(|closed| Json(closed.into()))
}

// 予約を取得し、操作が許可されているか確かめる
async fn authorized_booking(
    registry: &AppRegistry,
    user: &AuthorizedUser,
    booking_id: BookingId,
    action: BookingAction,
) -> AppResult<Booking> {
    let booking = registry
        .booking_repository()
        .find_by_id(booking_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("予約（{booking_id}）が見つかりませんでした。")))?;

    if !booking.permits(&user.identity, action) {
        return Err(AppError::ForbiddenOperation);
    }
    Ok(booking)
}
