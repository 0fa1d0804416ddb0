use std::collections::HashMap;

use crate::database::{
    model::{
        conversation::{ConversationRow, ExpiredConversationRow, MessageRow, ParticipantRow},
        parse_status,
    },
    ConnectionPool,
};
use crate::repository::{
    booking::{lock_booking, transition_booking},
    payment::fail_pending_payment,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::model::{
    booking::status::{BookingStatus, BookingTransition},
    conversation::{
        event::{CloseConversation, CreateMessage, OpenConversation},
        CloseReason, Conversation, ConversationClosed, ConversationStatus, ConversationWindow,
        ExpiredConversation, Message, Participant,
    },
    id::{BookingId, ConversationId, MessageId, ParticipantId, UserId},
    payment::PaymentStatus,
};
use kernel::repository::conversation::ConversationRepository;
use shared::error::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};

#[derive(new)]
pub struct ConversationRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ConversationRepository for ConversationRepositoryImpl {
    async fn open_conversation(&self, event: OpenConversation) -> AppResult<Conversation> {
        let mut tx = self.db.begin().await?;

        let booking = lock_booking(&mut tx, event.booking_id).await?;
        let current: BookingStatus = parse_status(&booking.status, "bookings.status")?;
        let next = current.apply(BookingTransition::Schedule)?;

        // ロック取得後に支払い状態を確認し直す
        let paid = booking
            .payment_status
            .as_deref()
            .map(|s| parse_status::<PaymentStatus>(s, "payment_status"))
            .transpose()?
            == Some(PaymentStatus::Paid);
        if !paid {
            return Err(AppError::Conflict(format!(
                "予約（{}）の支払いが完了していません。",
                event.booking_id
            )));
        }

        transition_booking(&mut tx, event.booking_id, current, next).await?;

        let window = ConversationWindow::for_slot(booking.scheduled_at, event.window_length);
        let inserted: Option<(ConversationId,)> = sqlx::query_as(
            r#"
                INSERT INTO conversations (booking_id, start_time, end_time, conversation_status)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (booking_id) DO NOTHING
                RETURNING conversation_id
            "#,
        )
        .bind(event.booking_id)
        .bind(window.start)
        .bind(window.end)
        .bind(ConversationStatus::Open.as_ref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some((conversation_id,)) = inserted else {
            return Err(AppError::Conflict(format!(
                "予約（{}）の会話はすでに存在します。",
                event.booking_id
            )));
        };

        let participants: Vec<ParticipantRow> = sqlx::query_as(
            r#"
                INSERT INTO participants (conversation_id, user_id)
                VALUES ($1, $2), ($1, $3)
                RETURNING participant_id, conversation_id, user_id
            "#,
        )
        .bind(conversation_id)
        .bind(booking.customer_id)
        .bind(booking.stylist_user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(
            booking.id = %event.booking_id,
            conversation.id = %conversation_id,
            conversation.end = %window.end,
            "conversation opened"
        );

        Ok(Conversation {
            conversation_id,
            booking_id: event.booking_id,
            window,
            status: ConversationStatus::Open,
            participants: participants.into_iter().map(Participant::from).collect(),
        })
    }

    async fn close_conversation(&self, event: CloseConversation) -> AppResult<ConversationClosed> {
        let CloseConversation {
            booking_id,
            reason,
            closed_at,
        } = event;

        let mut tx = self.db.begin().await?;

        // ロック順: 予約 -> 支払い -> 会話 -> スタイリスト
        let booking = lock_booking(&mut tx, booking_id).await?;
        let current: BookingStatus = parse_status(&booking.status, "bookings.status")?;
        let next = current.apply(reason.transition())?;

        // 未払いのまま返金された予約を支払期限の掃除対象に残さない
        if reason == CloseReason::Refund {
            if let Some(payment_id) = fail_pending_payment(&mut tx, booking_id).await? {
                tracing::info!(
                    booking.id = %booking_id,
                    payment.id = %payment_id,
                    "pending payment failed by refund"
                );
            }
        }

        let conversation = lock_conversation_of(&mut tx, booking_id).await?;

        let conversation_id = match conversation {
            Some(row) => {
                if !close_if_open(&mut tx, row.conversation_id, closed_at).await? {
                    return Err(AppError::Conflict(format!(
                        "会話（{}）はすでに閉じられています。",
                        row.conversation_id
                    )));
                }
                Some(row.conversation_id)
            }
            // 会話が開かれる前の予約は返金のみ可能
            None if reason == CloseReason::Refund => None,
            None => {
                return Err(AppError::Conflict(format!(
                    "予約（{booking_id}）には会話がありません。"
                )))
            }
        };

        transition_booking(&mut tx, booking_id, current, next).await?;

        // 会話をこのトランザクションで閉じた場合だけ加算する
        let credited_amount = match (conversation_id, booking.amount) {
            (Some(_), Some(amount)) if reason.credits_stylist() => {
                sqlx::query(
                    r#"
                        UPDATE stylists
                        SET balance = balance + $2
                        WHERE stylist_id = $1
                    "#,
                )
                .bind(booking.stylist_id)
                .bind(amount)
                .execute(&mut *tx)
                .await
                .map_err(AppError::SpecificOperationError)?;
                Some(amount)
            }
            _ => None,
        };

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(
            booking.id = %booking_id,
            %reason,
            booking.status = %next,
            credited = ?credited_amount,
            "conversation closed"
        );

        Ok(ConversationClosed {
            booking_id,
            conversation_id,
            booking_status: next,
            credited_amount,
        })
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<ExpiredConversation>> {
        let rows: Vec<ExpiredConversationRow> = sqlx::query_as(
            r#"
                SELECT conversation_id, booking_id, end_time
                FROM conversations
                WHERE conversation_status = $1 AND end_time < $2
                ORDER BY end_time ASC
            "#,
        )
        .bind(ConversationStatus::Open.as_ref())
        .bind(now)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(ExpiredConversation::from).collect())
    }

    async fn find_by_id(&self, conversation_id: ConversationId) -> AppResult<Option<Conversation>> {
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
                SELECT conversation_id, booking_id, start_time, end_time, conversation_status
                FROM conversations
                WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut participants = fetch_participants(self.db.inner_ref(), &[conversation_id]).await?;
        let participants = participants.remove(&conversation_id).unwrap_or_default();
        row.into_conversation(participants).map(Some)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Conversation>> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            r#"
                SELECT c.conversation_id, c.booking_id, c.start_time, c.end_time, c.conversation_status
                FROM conversations AS c
                INNER JOIN participants AS p ON p.conversation_id = c.conversation_id
                WHERE p.user_id = $1
                ORDER BY c.start_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let ids: Vec<ConversationId> = rows.iter().map(|r| r.conversation_id).collect();
        let mut participants = fetch_participants(self.db.inner_ref(), &ids).await?;

        rows.into_iter()
            .map(|row| {
                let members = participants.remove(&row.conversation_id).unwrap_or_default();
                row.into_conversation(members)
            })
            .collect()
    }

    async fn find_messages(&self, conversation_id: ConversationId) -> AppResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
                SELECT
                    m.message_id,
                    m.conversation_id,
                    m.participant_id,
                    p.user_id,
                    m.message_text,
                    m.media,
                    m.media_type,
                    m.created_at
                FROM messages AS m
                INNER JOIN participants AS p ON p.participant_id = m.participant_id
                WHERE m.conversation_id = $1
                ORDER BY m.created_at ASC, m.message_id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn post_message(&self, event: CreateMessage) -> AppResult<Message> {
        let mut tx = self.db.begin().await?;

        // 投稿中に会話が閉じられないよう共有ロックを取る
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
                SELECT conversation_id, booking_id, start_time, end_time, conversation_status
                FROM conversations
                WHERE conversation_id = $1
                FOR SHARE
            "#,
        )
        .bind(event.conversation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "会話（{}）が見つかりませんでした。",
                event.conversation_id
            )));
        };

        let participant: Option<(ParticipantId,)> = sqlx::query_as(
            "SELECT participant_id FROM participants WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(event.conversation_id)
        .bind(event.user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some((participant_id,)) = participant else {
            return Err(AppError::ForbiddenOperation);
        };

        let conversation = row.into_conversation(Vec::new())?;
        if !conversation.accepts_messages_at(event.sent_at) {
            return Err(AppError::Conflict(format!(
                "会話（{}）は現在メッセージを受け付けていません。",
                event.conversation_id
            )));
        }

        let (message_id, created_at): (MessageId, DateTime<Utc>) = sqlx::query_as(
            r#"
                INSERT INTO messages
                (conversation_id, participant_id, message_text, media, media_type, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING message_id, created_at
            "#,
        )
        .bind(event.conversation_id)
        .bind(participant_id)
        .bind(&event.message_text)
        .bind(event.media.as_deref())
        .bind(event.media_type.as_deref())
        .bind(event.sent_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(Message {
            message_id,
            conversation_id: event.conversation_id,
            participant_id,
            user_id: event.user_id,
            message_text: event.message_text,
            media: event.media,
            media_type: event.media_type,
            created_at,
        })
    }
}

async fn lock_conversation_of(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
) -> AppResult<Option<ConversationRow>> {
    sqlx::query_as::<_, ConversationRow>(
        r#"
            SELECT conversation_id, booking_id, start_time, end_time, conversation_status
            FROM conversations
            WHERE booking_id = $1
            FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)
}

// open の会話だけを閉じる。閉じた場合は true
async fn close_if_open(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: ConversationId,
    closed_at: DateTime<Utc>,
) -> AppResult<bool> {
    let res = sqlx::query(
        r#"
            UPDATE conversations
            SET conversation_status = $2, end_time = $3
            WHERE conversation_id = $1 AND conversation_status = $4
        "#,
    )
    .bind(conversation_id)
    .bind(ConversationStatus::Closed.as_ref())
    .bind(closed_at)
    .bind(ConversationStatus::Open.as_ref())
    .execute(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;

    Ok(res.rows_affected() == 1)
}

// 支払期限切れで予約を取り消すときに使う。残高には触れない
pub(crate) async fn close_open_conversation_without_credit(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
    closed_at: DateTime<Utc>,
) -> AppResult<Option<ConversationId>> {
    let Some(row) = lock_conversation_of(tx, booking_id).await? else {
        return Ok(None);
    };
    let closed = close_if_open(tx, row.conversation_id, closed_at).await?;
    Ok(closed.then_some(row.conversation_id))
}

async fn fetch_participants(
    pool: &PgPool,
    conversation_ids: &[ConversationId],
) -> AppResult<HashMap<ConversationId, Vec<Participant>>> {
    if conversation_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let raw_ids: Vec<i64> = conversation_ids.iter().map(|id| id.raw()).collect();
    let rows: Vec<ParticipantRow> = sqlx::query_as(
        r#"
            SELECT participant_id, conversation_id, user_id
            FROM participants
            WHERE conversation_id = ANY($1)
            ORDER BY participant_id ASC
        "#,
    )
    .bind(&raw_ids)
    .fetch_all(pool)
    .await
    .map_err(AppError::SpecificOperationError)?;

    let mut grouped: HashMap<ConversationId, Vec<Participant>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.conversation_id)
            .or_default()
            .push(Participant::from(row));
    }
    Ok(grouped)
}
