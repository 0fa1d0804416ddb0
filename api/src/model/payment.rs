use chrono::{DateTime, Utc};
use kernel::model::{id::PaymentId, payment::Payment};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub payment_id: PaymentId,
    pub amount: i64,
    pub transfer_amount: Option<i64>,
    pub provider: Option<String>,
    pub status: String,
    pub payment_deadline: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentResponse {
    fn from(value: Payment) -> Self {
        let Payment {
            payment_id,
            amount,
            transfer_amount,
            provider,
            status,
            payment_deadline,
            payment_date,
        } = value;
        Self {
            payment_id,
            amount,
            transfer_amount,
            provider,
            status: status.to_string(),
            payment_deadline,
            payment_date,
        }
    }
}
