use crate::model::{
    booking::{
        event::{ConfirmBookingPayment, CreateBooking},
        Booking,
    },
    id::{BookingId, UserId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    // 予約と支払いレコードを作成する（status = pending）
    async fn create(&self, event: CreateBooking) -> AppResult<Booking>;
    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>>;
    // 顧客の予約一覧（新しい順）
    async fn find_by_customer_id(&self, customer_id: UserId) -> AppResult<Vec<Booking>>;
    // スタイリストの pending / cancelled 以外の予約一覧
    async fn find_active_by_stylist_user_id(&self, user_id: UserId) -> AppResult<Vec<Booking>>;
    // 支払いを paid にし、予約を waiting_confirmation に進める
    async fn confirm_payment(&self, event: ConfirmBookingPayment) -> AppResult<Booking>;
    // スタイリストによる承諾
    async fn accept(&self, booking_id: BookingId) -> AppResult<Booking>;
    // accepted かつ支払済みで、会話を開くべき予約
    async fn find_ready_to_schedule(&self) -> AppResult<Vec<BookingId>>;
    // scheduled のまま開始時刻を迎えた予約
    async fn find_due_to_start(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingId>>;
    // scheduled -> ongoing
    async fn start(&self, booking_id: BookingId, now: DateTime<Utc>) -> AppResult<()>;
}
