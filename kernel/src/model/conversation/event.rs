use crate::model::id::{BookingId, ConversationId, UserId};
use chrono::{DateTime, Duration, Utc};
use derive_new::new;

use super::CloseReason;

#[derive(new, Debug)]
pub struct OpenConversation {
    pub booking_id: BookingId,
    // 予約枠の開始時刻からの長さ
    pub window_length: Duration,
}

#[derive(new, Debug, Clone, Copy)]
pub struct CloseConversation {
    pub booking_id: BookingId,
    pub reason: CloseReason,
    pub closed_at: DateTime<Utc>,
}

#[derive(new, Debug)]
pub struct CreateMessage {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub message_text: String,
    pub media: Option<String>,
    pub media_type: Option<String>,
    pub sent_at: DateTime<Utc>,
}
