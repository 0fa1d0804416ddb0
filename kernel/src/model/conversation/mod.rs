use crate::model::{
    booking::status::{BookingStatus, BookingTransition},
    id::{BookingId, ConversationId, MessageId, ParticipantId, UserId},
};
use chrono::{DateTime, Duration, Utc};
use strum::{AsRefStr, Display, EnumString};

pub mod event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConversationStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CloseReason {
    // 終了時刻を過ぎたためスイープが閉じた
    Expired,
    // 利用者が予約終了操作を行った
    Manual,
    Refund,
}

impl CloseReason {
    pub fn credits_stylist(self) -> bool {
        !matches!(self, Self::Refund)
    }

    pub fn transition(self) -> BookingTransition {
        BookingTransition::Close(self)
    }
}

// 会話でやり取りできる期間 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ConversationWindow {
    pub fn for_slot(slot_start: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start: slot_start,
            end: slot_start + length,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }
}

#[derive(Debug)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub booking_id: BookingId,
    pub window: ConversationWindow,
    pub status: ConversationStatus,
    pub participants: Vec<Participant>,
}

impl Conversation {
    pub fn participant_of(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn accepts_messages_at(&self, at: DateTime<Utc>) -> bool {
        self.status == ConversationStatus::Open && self.window.contains(at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub user_id: UserId,
}

#[derive(Debug)]
pub struct Message {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub participant_id: ParticipantId,
    pub user_id: UserId,
    pub message_text: String,
    pub media: Option<String>,
    pub media_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExpiredConversation {
    pub conversation_id: ConversationId,
    pub booking_id: BookingId,
    pub end_time: DateTime<Utc>,
}

// close_conversation の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationClosed {
    pub booking_id: BookingId,
    // 会話を持たない予約の返金では None
    pub conversation_id: Option<ConversationId>,
    pub booking_status: BookingStatus,
    // スタイリスト残高に加算した金額。加算しなかった場合は None
    pub credited_amount: Option<i64>,
}
