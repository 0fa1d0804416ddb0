use crate::{
    extractor::AuthorizedUser,
    model::conversation::{
        ConversationDetailResponse, ConversationsResponse, CreateMessageRequest,
        CreateMessageRequestWithIds, MessageResponse,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::id::ConversationId;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn show_my_conversations(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ConversationsResponse>> {
    registry
        .conversation_repository()
        .find_by_user_id(user.id())
        .await
        .map(ConversationsResponse::from)
        .map(Json)
}

pub async fn show_conversation(
    user: AuthorizedUser,
    Path(conversation_id): Path<ConversationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ConversationDetailResponse>> {
    let repository = registry.conversation_repository();
    let conversation = repository
        .find_by_id(conversation_id)
        .await?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("会話（{conversation_id}）が見つかりませんでした。"))
        })?;

    if conversation.participant_of(user.id()).is_none() && !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }

    let messages = repository.find_messages(conversation_id).await?;
    Ok(Json(ConversationDetailResponse {
        conversation: conversation.into(),
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

pub async fn post_message(
    user: AuthorizedUser,
    Path(conversation_id): Path<ConversationId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateMessageRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    req.validate(&())?;

    let event = CreateMessageRequestWithIds::new(conversation_id, user.id(), Utc::now(), req);
    registry
        .conversation_repository()
        .post_message(event.into())
        .await
        .map(|message| (StatusCode::CREATED, Json(message.into())))
}
