use crate::model::{
    booking::status::{BookingStatus, BookingTransition},
    id::{BookingId, OrderId, PaymentId},
    order::OrderStatus,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub amount: i64,
    pub transfer_amount: Option<i64>,
    pub provider: Option<String>,
    pub status: PaymentStatus,
    pub payment_deadline: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
}

impl Payment {
    // 期限ちょうどの時刻も期限切れとして扱う
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentStatus::Pending && self.payment_deadline <= now
    }
}

// 支払いレコードの持ち主。予約か注文のどちらか一方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentOwner {
    Booking(BookingId),
    Order(OrderId),
}

impl PaymentOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Booking(_) => "booking",
            Self::Order(_) => "order",
        }
    }

    pub fn raw_id(&self) -> i64 {
        match self {
            Self::Booking(id) => id.raw(),
            Self::Order(id) => id.raw(),
        }
    }

    // 支払期限切れで cancelled に遷移できる持ち主側のステータス
    pub fn cancellable_statuses(&self) -> Vec<String> {
        match self {
            Self::Booking(_) => BookingTransition::PaymentExpired.source_names(),
            Self::Order(_) => vec![OrderStatus::Pending.to_string()],
        }
    }

    pub fn cancelled_status(&self) -> String {
        match self {
            Self::Booking(_) => BookingStatus::Cancelled.to_string(),
            Self::Order(_) => OrderStatus::Cancelled.to_string(),
        }
    }
}

impl std::fmt::Display for PaymentOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind(), self.raw_id())
    }
}

#[derive(Debug, Clone)]
pub struct ExpiredPayment {
    pub payment_id: PaymentId,
    pub owner: PaymentOwner,
    pub payment_deadline: DateTime<Utc>,
}

pub fn payment_deadline(created_at: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    created_at + window
}

// 銀行振込の照合用の端数 (0〜999)
pub fn transfer_suffix<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(0..1000)
}

pub fn transfer_amount<R: Rng + ?Sized>(amount: i64, rng: &mut R) -> i64 {
    amount + transfer_suffix(rng)
}
