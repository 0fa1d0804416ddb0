use crate::model::{
    id::PaymentId,
    payment::{ExpiredPayment, PaymentOwner},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    // pending のまま支払期限を過ぎた支払い（持ち主付き）
    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<ExpiredPayment>>;
    // 1 件の支払いを failed にし、持ち主を cancelled にする
    // 注文なら在庫を戻す。すでに処理済みなら None
    async fn expire(
        &self,
        payment_id: PaymentId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PaymentOwner>>;
}
