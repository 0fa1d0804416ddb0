use crate::model::id::{BookingId, StylistId, UserId};
use chrono::{DateTime, Utc};
use derive_new::new;

use super::slot::BookingSlot;

#[derive(new, Debug)]
pub struct CreateBooking {
    pub booking_number: String,
    pub customer_id: UserId,
    pub stylist_id: StylistId,
    pub slot: BookingSlot,
    // slot を現地オフセットで変換した絶対時刻
    pub scheduled_at: DateTime<Utc>,
    pub amount: i64,
    pub transfer_amount: i64,
    pub provider: Option<String>,
    pub payment_deadline: DateTime<Utc>,
}

#[derive(new, Debug)]
pub struct ConfirmBookingPayment {
    pub booking_id: BookingId,
    pub paid_at: DateTime<Utc>,
}
