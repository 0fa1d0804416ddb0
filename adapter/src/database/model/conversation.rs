use super::parse_status;
use kernel::model::{
    conversation::{
        Conversation, ConversationWindow, ExpiredConversation, Message, Participant,
    },
    id::{BookingId, ConversationId, MessageId, ParticipantId, UserId},
};
use shared::error::AppResult;
use sqlx::types::chrono::{DateTime, Utc};

#[derive(sqlx::FromRow)]
pub struct ConversationRow {
    pub conversation_id: ConversationId,
    pub booking_id: BookingId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub conversation_status: String,
}

impl ConversationRow {
    // 参加者は別クエリで取得して渡す
    pub fn into_conversation(self, participants: Vec<Participant>) -> AppResult<Conversation> {
        let ConversationRow {
            conversation_id,
            booking_id,
            start_time,
            end_time,
            conversation_status,
        } = self;
        Ok(Conversation {
            conversation_id,
            booking_id,
            window: ConversationWindow {
                start: start_time,
                end: end_time,
            },
            status: parse_status(&conversation_status, "conversations.conversation_status")?,
            participants,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct ParticipantRow {
    pub participant_id: ParticipantId,
    pub conversation_id: ConversationId,
    pub user_id: UserId,
}

impl From<ParticipantRow> for Participant {
    fn from(value: ParticipantRow) -> Self {
        Participant {
            participant_id: value.participant_id,
            user_id: value.user_id,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct MessageRow {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub participant_id: ParticipantId,
    pub user_id: UserId,
    pub message_text: String,
    pub media: Option<String>,
    pub media_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(value: MessageRow) -> Self {
        let MessageRow {
            message_id,
            conversation_id,
            participant_id,
            user_id,
            message_text,
            media,
            media_type,
            created_at,
        } = value;
        Message {
            message_id,
            conversation_id,
            participant_id,
            user_id,
            message_text,
            media,
            media_type,
            created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct ExpiredConversationRow {
    pub conversation_id: ConversationId,
    pub booking_id: BookingId,
    pub end_time: DateTime<Utc>,
}

impl From<ExpiredConversationRow> for ExpiredConversation {
    fn from(value: ExpiredConversationRow) -> Self {
        ExpiredConversation {
            conversation_id: value.conversation_id,
            booking_id: value.booking_id,
            end_time: value.end_time,
        }
    }
}
