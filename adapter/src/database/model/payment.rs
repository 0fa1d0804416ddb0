use super::parse_status;
use kernel::model::{
    id::{BookingId, OrderId, PaymentId},
    payment::{ExpiredPayment, Payment, PaymentOwner},
};
use shared::error::{AppError, AppResult};
use sqlx::types::chrono::{DateTime, Utc};

// LEFT JOIN payment_details した列。支払いが無い場合はすべて None
#[derive(sqlx::FromRow)]
pub struct JoinedPaymentRow {
    pub payment_id: Option<PaymentId>,
    pub amount: Option<i64>,
    pub transfer_amount: Option<i64>,
    pub provider: Option<String>,
    pub payment_status: Option<String>,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub payment_date: Option<DateTime<Utc>>,
}

impl JoinedPaymentRow {
    pub fn into_payment(self) -> AppResult<Option<Payment>> {
        let JoinedPaymentRow {
            payment_id,
            amount,
            transfer_amount,
            provider,
            payment_status,
            payment_deadline,
            payment_date,
        } = self;
        let (Some(payment_id), Some(amount), Some(status), Some(payment_deadline)) =
            (payment_id, amount, payment_status, payment_deadline)
        else {
            return Ok(None);
        };
        Ok(Some(Payment {
            payment_id,
            amount,
            transfer_amount,
            provider,
            status: parse_status(&status, "payment_status")?,
            payment_deadline,
            payment_date,
        }))
    }
}

// 期限切れの支払いと、その持ち主
#[derive(sqlx::FromRow)]
pub struct ExpiredPaymentRow {
    pub payment_id: PaymentId,
    pub payment_deadline: DateTime<Utc>,
    pub booking_id: Option<BookingId>,
    pub order_id: Option<OrderId>,
}

impl TryFrom<ExpiredPaymentRow> for ExpiredPayment {
    type Error = AppError;

    fn try_from(value: ExpiredPaymentRow) -> Result<Self, Self::Error> {
        let ExpiredPaymentRow {
            payment_id,
            payment_deadline,
            booking_id,
            order_id,
        } = value;
        let owner = owner_of(payment_id, booking_id, order_id)?;
        Ok(ExpiredPayment {
            payment_id,
            owner,
            payment_deadline,
        })
    }
}

// 予約と注文の両方、またはどちらにも紐づかない支払いはデータ不整合
pub(crate) fn owner_of(
    payment_id: PaymentId,
    booking_id: Option<BookingId>,
    order_id: Option<OrderId>,
) -> AppResult<PaymentOwner> {
    match (booking_id, order_id) {
        (Some(b), None) => Ok(PaymentOwner::Booking(b)),
        (None, Some(o)) => Ok(PaymentOwner::Order(o)),
        _ => Err(AppError::ConversionEntityError(format!(
            "支払い（{payment_id}）の持ち主を一意に特定できません。"
        ))),
    }
}
