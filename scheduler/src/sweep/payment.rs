use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::{model::payment::PaymentOwner, repository::payment::PaymentRepository};

use crate::{
    report::{bounded, SweepReport},
    Sweep,
};

const NAME: &str = "payment-expiry";

// 支払期限切れの支払いを failed にし、予約・注文を取り消す
#[derive(new)]
pub struct PaymentExpirySweep {
    payments: Arc<dyn PaymentRepository>,
    record_timeout: Duration,
}

impl PaymentExpirySweep {
    // 取り消した予約・注文を返す
    pub async fn reconcile_expired_payments(&self, now: DateTime<Utc>) -> Vec<PaymentOwner> {
        self.reconcile(now).await.0
    }

    async fn reconcile(&self, now: DateTime<Utc>) -> (Vec<PaymentOwner>, SweepReport) {
        let mut report = SweepReport::default();
        let mut owners = Vec::new();

        let expired = match self.payments.find_expired(now).await {
            Ok(expired) => expired,
            Err(e) => {
                tracing::warn!(sweep = NAME, error.message = %e, "failed to list expired payments");
                return (owners, report);
            }
        };

        for payment in expired {
            let record = payment.owner;
            let result = bounded(
                self.record_timeout,
                &record,
                self.payments.expire(payment.payment_id, now),
            )
            .await;
            let result = result.map(|owner| match owner {
                Some(owner) => {
                    owners.push(owner);
                    true
                }
                None => false,
            });
            report.tally(NAME, &record, result);
        }

        (owners, report)
    }
}

#[async_trait]
impl Sweep for PaymentExpirySweep {
    async fn run(&self, now: DateTime<Utc>) -> SweepReport {
        self.reconcile(now).await.1
    }
}
