use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::{
    model::conversation::event::OpenConversation,
    repository::{booking::BookingRepository, conversation::ConversationRepository},
};

use crate::{
    report::{bounded, SweepReport},
    Sweep,
};

// accepted かつ支払済みの予約を scheduled にし、会話を開く
#[derive(new)]
pub struct BookingScheduleSweep {
    bookings: Arc<dyn BookingRepository>,
    conversations: Arc<dyn ConversationRepository>,
    window_length: chrono::Duration,
    record_timeout: Duration,
}

#[async_trait]
impl Sweep for BookingScheduleSweep {
    async fn run(&self, _now: DateTime<Utc>) -> SweepReport {
        const NAME: &str = "booking-schedule";
        let mut report = SweepReport::default();

        let ready = match self.bookings.find_ready_to_schedule().await {
            Ok(ready) => ready,
            Err(e) => {
                tracing::warn!(sweep = NAME, error.message = %e, "failed to list bookings");
                return report;
            }
        };

        for booking_id in ready {
            let event = OpenConversation::new(booking_id, self.window_length);
            let result = bounded(
                self.record_timeout,
                &booking_id,
                self.conversations.open_conversation(event),
            )
            .await
            .map(|_| true);
            report.tally(NAME, &booking_id, result);
        }

        report
    }
}

// 開始時刻を迎えた scheduled の予約を ongoing にする
#[derive(new)]
pub struct BookingStartSweep {
    bookings: Arc<dyn BookingRepository>,
    record_timeout: Duration,
}

#[async_trait]
impl Sweep for BookingStartSweep {
    async fn run(&self, now: DateTime<Utc>) -> SweepReport {
        const NAME: &str = "booking-start";
        let mut report = SweepReport::default();

        let due = match self.bookings.find_due_to_start(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::warn!(sweep = NAME, error.message = %e, "failed to list bookings");
                return report;
            }
        };

        for booking_id in due {
            let result = bounded(
                self.record_timeout,
                &booking_id,
                self.bookings.start(booking_id, now),
            )
            .await
            .map(|_| true);
            report.tally(NAME, &booking_id, result);
        }

        report
    }
}
