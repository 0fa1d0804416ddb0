use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::{
    model::conversation::{event::CloseConversation, CloseReason},
    repository::conversation::ConversationRepository,
};

use crate::{
    report::{bounded, SweepReport},
    Sweep,
};

const NAME: &str = "conversation-expiry";

// 終了時刻を過ぎた会話を閉じ、予約を done にしてスタイリストへ入金する
#[derive(new)]
pub struct ConversationExpirySweep {
    conversations: Arc<dyn ConversationRepository>,
    record_timeout: Duration,
}

#[async_trait]
impl Sweep for ConversationExpirySweep {
    async fn run(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        let expired = match self.conversations.find_expired(now).await {
            Ok(expired) => expired,
            Err(e) => {
                tracing::warn!(sweep = NAME, error.message = %e, "failed to list conversations");
                return report;
            }
        };

        for conversation in expired {
            let event = CloseConversation::new(conversation.booking_id, CloseReason::Expired, now);
            let result = bounded(
                self.record_timeout,
                &conversation.conversation_id,
                self.conversations.close_conversation(event),
            )
            .await
            .map(|closed| {
                tracing::debug!(
                    booking.id = %closed.booking_id,
                    credited = ?closed.credited_amount,
                    "expired conversation closed"
                );
                true
            });
            report.tally(NAME, &conversation.conversation_id, result);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::{
        model::{
            booking::status::BookingStatus,
            conversation::{ConversationClosed, ExpiredConversation},
            id::{BookingId, ConversationId},
        },
        repository::conversation::MockConversationRepository,
    };
    use shared::error::AppError;

    fn expired(id: i64) -> ExpiredConversation {
        ExpiredConversation {
            conversation_id: ConversationId::new(id),
            booking_id: BookingId::new(id),
            end_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn closes_each_expired_conversation_with_expired_reason() {
        let mut repo = MockConversationRepository::new();
        repo.expect_find_expired()
            .returning(|_| Ok(vec![expired(1), expired(2), expired(3)]));
        repo.expect_close_conversation()
            .withf(|e| e.reason == CloseReason::Expired)
            .times(3)
            .returning(|e| match e.booking_id.raw() {
                // 利用者が先に終了させていた
                2 => Err(AppError::Conflict("already closed".into())),
                3 => Err(AppError::NoRowsAffectedError("stylist".into())),
                _ => Ok(ConversationClosed {
                    booking_id: e.booking_id,
                    conversation_id: Some(ConversationId::new(e.booking_id.raw())),
                    booking_status: BookingStatus::Done,
                    credited_amount: Some(150_000),
                }),
            });

        let sweep = ConversationExpirySweep::new(Arc::new(repo), Duration::from_secs(10));
        let report = sweep.run(Utc::now()).await;
        assert_eq!(
            report,
            SweepReport {
                processed: 1,
                skipped: 1,
                failed: 1,
            }
        );
    }
}
