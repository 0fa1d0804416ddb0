use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    conversation::{event::CreateMessage, Conversation, Message, Participant},
    id::{BookingId, ConversationId, MessageId, ParticipantId, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub participant_id: ParticipantId,
    pub user_id: UserId,
}

impl From<Participant> for ParticipantResponse {
    fn from(value: Participant) -> Self {
        Self {
            participant_id: value.participant_id,
            user_id: value.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation_id: ConversationId,
    pub booking_id: BookingId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub participants: Vec<ParticipantResponse>,
}

impl From<Conversation> for ConversationResponse {
    fn from(value: Conversation) -> Self {
        let Conversation {
            conversation_id,
            booking_id,
            window,
            status,
            participants,
        } = value;
        Self {
            conversation_id,
            booking_id,
            start_time: window.start,
            end_time: window.end,
            status: status.to_string(),
            participants: participants.into_iter().map(ParticipantResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsResponse {
    pub items: Vec<ConversationResponse>,
}

impl From<Vec<Conversation>> for ConversationsResponse {
    fn from(value: Vec<Conversation>) -> Self {
        Self {
            items: value.into_iter().map(ConversationResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetailResponse {
    #[serde(flatten)]
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub message_text: String,
    pub media: Option<String>,
    pub media_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(value: Message) -> Self {
        let Message {
            message_id,
            conversation_id,
            user_id,
            message_text,
            media,
            media_type,
            created_at,
            ..
        } = value;
        Self {
            message_id,
            conversation_id,
            user_id,
            message_text,
            media,
            media_type,
            created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    #[garde(length(min = 1, max = 2000))]
    pub message_text: String,
    #[garde(length(min = 1, max = 1024))]
    pub media: Option<String>,
    #[garde(length(min = 1, max = 64))]
    pub media_type: Option<String>,
}

#[derive(new)]
pub struct CreateMessageRequestWithIds(ConversationId, UserId, DateTime<Utc>, CreateMessageRequest);

impl From<CreateMessageRequestWithIds> for CreateMessage {
    fn from(value: CreateMessageRequestWithIds) -> Self {
        let CreateMessageRequestWithIds(
            conversation_id,
            user_id,
            sent_at,
            CreateMessageRequest {
                message_text,
                media,
                media_type,
            },
        ) = value;
        CreateMessage {
            conversation_id,
            user_id,
            message_text,
            media,
            media_type,
            sent_at,
        }
    }
}
