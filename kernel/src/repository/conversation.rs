use crate::model::{
    conversation::{
        event::{CloseConversation, CreateMessage, OpenConversation},
        Conversation, ConversationClosed, ExpiredConversation, Message,
    },
    id::{ConversationId, UserId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    // 予約を accepted -> scheduled に進め、会話と参加者 2 名を作成する
    async fn open_conversation(&self, event: OpenConversation) -> AppResult<Conversation>;
    // 会話を閉じ、予約を done / refunded にする
    // 理由が返金以外なら、同じトランザクションでスタイリスト残高に加算する
    async fn close_conversation(&self, event: CloseConversation) -> AppResult<ConversationClosed>;
    // open のまま end_time を過ぎた会話
    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<ExpiredConversation>>;
    async fn find_by_id(&self, conversation_id: ConversationId) -> AppResult<Option<Conversation>>;
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Conversation>>;
    async fn find_messages(&self, conversation_id: ConversationId) -> AppResult<Vec<Message>>;
    async fn post_message(&self, event: CreateMessage) -> AppResult<Message>;
}
