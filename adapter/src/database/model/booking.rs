use super::{parse_status, payment::JoinedPaymentRow};
use kernel::model::{
    booking::{Booking, BookingStylist},
    id::{BookingId, StylistId, UserId},
};
use shared::error::AppError;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveTime, Utc};

// bookings に stylists と payment_details を結合した行
#[derive(sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub customer_id: UserId,
    pub stylist_id: StylistId,
    pub stylist_user_id: UserId,
    pub brand_name: Option<String>,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub is_reviewed: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub payment: JoinedPaymentRow,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(value: BookingRow) -> Result<Self, Self::Error> {
        let BookingRow {
            booking_id,
            booking_number,
            customer_id,
            stylist_id,
            stylist_user_id,
            brand_name,
            booking_date,
            booking_time,
            scheduled_at,
            status,
            is_reviewed,
            created_at,
            payment,
        } = value;
        Ok(Booking {
            booking_id,
            booking_number,
            customer_id,
            stylist: BookingStylist {
                stylist_id,
                user_id: stylist_user_id,
                brand_name,
            },
            booking_date,
            booking_time,
            scheduled_at,
            status: parse_status(&status, "bookings.status")?,
            is_reviewed,
            payment: payment.into_payment()?,
            created_at,
        })
    }
}

// 状態遷移の前に FOR UPDATE で取得する行
#[derive(sqlx::FromRow)]
pub struct BookingLockRow {
    pub booking_id: BookingId,
    pub status: String,
    pub stylist_id: StylistId,
    pub stylist_user_id: UserId,
    pub customer_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub amount: Option<i64>,
    pub payment_status: Option<String>,
}
