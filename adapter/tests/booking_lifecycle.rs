// PostgreSQL が必要なため既定では実行しない
// DATABASE_URL を設定して `cargo test -p adapter -- --ignored` で実行する

use adapter::{
    database::ConnectionPool,
    repository::{
        booking::BookingRepositoryImpl, conversation::ConversationRepositoryImpl,
        payment::PaymentRepositoryImpl,
    },
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use kernel::{
    model::{
        booking::{
            event::{ConfirmBookingPayment, CreateBooking},
            slot::BookingSlot,
            status::BookingStatus,
        },
        conversation::{event::*, CloseReason, ConversationStatus},
        id::{BookingId, ConversationId, PaymentId, StylistId, UserId},
        payment::{PaymentOwner, PaymentStatus},
    },
    repository::{
        booking::BookingRepository, conversation::ConversationRepository,
        payment::PaymentRepository,
    },
};
use shared::error::AppError;
use sqlx::PgPool;

const CUSTOMER: UserId = UserId::new(1);
const STYLIST_USER: UserId = UserId::new(2);
const OUTSIDER: UserId = UserId::new(4);
const STYLIST: StylistId = StylistId::new(1);
const AMOUNT: i64 = 150_000;

struct Repos {
    booking: BookingRepositoryImpl,
    conversation: ConversationRepositoryImpl,
    payment: PaymentRepositoryImpl,
}

fn repos(pool: &PgPool) -> Repos {
    let db = ConnectionPool::new(pool.clone());
    Repos {
        booking: BookingRepositoryImpl::new(db.clone()),
        conversation: ConversationRepositoryImpl::new(db.clone()),
        payment: PaymentRepositoryImpl::new(db),
    }
}

fn create_event(number: &str, scheduled_at: DateTime<Utc>, deadline: DateTime<Utc>) -> CreateBooking {
    let slot = BookingSlot::new(scheduled_at.date_naive(), scheduled_at.time());
    CreateBooking::new(
        number.into(),
        CUSTOMER,
        STYLIST,
        slot,
        scheduled_at,
        AMOUNT,
        AMOUNT + 123,
        Some("bank_transfer".into()),
        deadline,
    )
}

async fn balance(pool: &PgPool) -> i64 {
    let (balance,): (i64,) = sqlx::query_as("SELECT balance FROM stylists WHERE stylist_id = 1")
        .fetch_one(pool)
        .await
        .unwrap();
    balance
}

// pending -> waiting_confirmation -> accepted -> scheduled まで進め、会話 ID を返す
async fn schedule(r: &Repos, number: &str, scheduled_at: DateTime<Utc>) -> (BookingId, ConversationId) {
    let now = Utc::now();
    let booking = r
        .booking
        .create(create_event(number, scheduled_at, now + Duration::minutes(30)))
        .await
        .unwrap();
    r.booking
        .confirm_payment(ConfirmBookingPayment::new(booking.booking_id, now))
        .await
        .unwrap();
    r.booking.accept(booking.booking_id).await.unwrap();

    let ready = r.booking.find_ready_to_schedule().await.unwrap();
    assert!(ready.contains(&booking.booking_id));

    let conversation = r
        .conversation
        .open_conversation(OpenConversation::new(booking.booking_id, Duration::minutes(30)))
        .await
        .unwrap();
    (booking.booking_id, conversation.conversation_id)
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn booking_runs_to_done_and_credits_stylist_once(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let (booking_id, conversation_id) = schedule(&r, "STLST1", now - Duration::minutes(1)).await;

    let due = r.booking.find_due_to_start(now).await.unwrap();
    assert_eq!(due, vec![booking_id]);
    r.booking.start(booking_id, now).await.unwrap();

    let closed = r
        .conversation
        .close_conversation(CloseConversation::new(booking_id, CloseReason::Manual, now))
        .await
        .unwrap();
    assert_eq!(closed.booking_status, BookingStatus::Done);
    assert_eq!(closed.conversation_id, Some(conversation_id));
    assert_eq!(closed.credited_amount, Some(AMOUNT));
    assert_eq!(balance(&pool).await, AMOUNT);

    // 二度目の終了は失敗し、残高は変わらない
    let again = r
        .conversation
        .close_conversation(CloseConversation::new(booking_id, CloseReason::Expired, now))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(balance(&pool).await, AMOUNT);

    let conversation = r.conversation.find_by_id(conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.status, ConversationStatus::Closed);
    assert_eq!(conversation.participants.len(), 2);
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn accept_before_payment_keeps_accepted(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let booking = r
        .booking
        .create(create_event("STLST2", now + Duration::days(1), now + Duration::minutes(30)))
        .await
        .unwrap();

    let accepted = r.booking.accept(booking.booking_id).await.unwrap();
    assert_eq!(accepted.status, BookingStatus::Accepted);

    let paid = r
        .booking
        .confirm_payment(ConfirmBookingPayment::new(booking.booking_id, now))
        .await
        .unwrap();
    assert_eq!(paid.status, BookingStatus::Accepted);
    assert_eq!(paid.payment.map(|p| p.status), Some(PaymentStatus::Paid));
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn overdue_payment_cancels_booking_once(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let booking = r
        .booking
        .create(create_event("STLST3", now + Duration::days(1), now - Duration::seconds(1)))
        .await
        .unwrap();
    let payment_id = booking.payment.as_ref().unwrap().payment_id;

    let expired = r.payment.find_expired(now).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].owner, PaymentOwner::Booking(booking.booking_id));

    let owner = r.payment.expire(payment_id, now).await.unwrap();
    assert_eq!(owner, Some(PaymentOwner::Booking(booking.booking_id)));

    let cancelled = r.booking.find_by_id(booking.booking_id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.payment.map(|p| p.status), Some(PaymentStatus::Failed));

    // 再実行しても何も起きない
    assert_eq!(r.payment.expire(payment_id, now).await.unwrap(), None);
    assert!(r.payment.find_expired(now).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn payment_after_deadline_is_rejected(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let booking = r
        .booking
        .create(create_event("STLST4", now + Duration::days(1), now))
        .await
        .unwrap();

    let res = r
        .booking
        .confirm_payment(ConfirmBookingPayment::new(booking.booking_id, now))
        .await;
    assert!(matches!(res, Err(AppError::Conflict(_))));
}

// ミリ秒未満の端数を持つ期限でも、その時刻ちょうどで期限切れになる
#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn sub_millisecond_deadline_is_reached_at_its_instant(pool: PgPool) {
    let r = repos(&pool);
    let deadline = Utc::now().trunc_subsecs(3) + Duration::microseconds(999);
    let booking = r
        .booking
        .create(create_event("STLST10", deadline + Duration::days(1), deadline))
        .await
        .unwrap();
    let payment_id = booking.payment.as_ref().unwrap().payment_id;

    let res = r
        .booking
        .confirm_payment(ConfirmBookingPayment::new(booking.booking_id, deadline))
        .await;
    assert!(matches!(res, Err(AppError::Conflict(_))));

    let expired = r.payment.find_expired(deadline).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(
        r.payment.expire(payment_id, deadline).await.unwrap(),
        Some(PaymentOwner::Booking(booking.booking_id))
    );
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn refund_without_conversation_only_moves_booking(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let booking = r
        .booking
        .create(create_event("STLST5", now + Duration::days(1), now + Duration::minutes(30)))
        .await
        .unwrap();

    let closed = r
        .conversation
        .close_conversation(CloseConversation::new(booking.booking_id, CloseReason::Refund, now))
        .await
        .unwrap();
    assert_eq!(closed.booking_status, BookingStatus::Refunded);
    assert_eq!(closed.conversation_id, None);
    assert_eq!(closed.credited_amount, None);
    assert_eq!(balance(&pool).await, 0);

    // 会話の無い予約は手動終了できない
    let booking = r
        .booking
        .create(create_event("STLST6", now + Duration::days(1), now + Duration::minutes(30)))
        .await
        .unwrap();
    let manual = r
        .conversation
        .close_conversation(CloseConversation::new(booking.booking_id, CloseReason::Manual, now))
        .await;
    assert!(matches!(manual, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn refund_of_scheduled_booking_does_not_credit(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let (booking_id, conversation_id) = schedule(&r, "STLST7", now + Duration::hours(2)).await;

    let closed = r
        .conversation
        .close_conversation(CloseConversation::new(booking_id, CloseReason::Refund, now))
        .await
        .unwrap();
    assert_eq!(closed.booking_status, BookingStatus::Refunded);
    assert_eq!(closed.conversation_id, Some(conversation_id));
    assert_eq!(closed.credited_amount, None);
    assert_eq!(balance(&pool).await, 0);
}

// 未払いのまま返金した予約の支払いは、返金と同時に failed になる
#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn refund_of_unpaid_booking_fails_its_payment(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let booking = r
        .booking
        .create(create_event("STLST11", now + Duration::days(1), now + Duration::minutes(30)))
        .await
        .unwrap();
    let payment_id = booking.payment.as_ref().unwrap().payment_id;

    r.conversation
        .close_conversation(CloseConversation::new(booking.booking_id, CloseReason::Refund, now))
        .await
        .unwrap();

    let refunded = r.booking.find_by_id(booking.booking_id).await.unwrap().unwrap();
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(refunded.payment.map(|p| p.status), Some(PaymentStatus::Failed));

    // 期限を過ぎても支払期限の掃除対象にならない
    let later = now + Duration::minutes(31);
    assert!(r.payment.find_expired(later).await.unwrap().is_empty());
    assert_eq!(r.payment.expire(payment_id, later).await.unwrap(), None);
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn refund_of_ongoing_booking_does_not_credit(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let (booking_id, conversation_id) = schedule(&r, "STLST12", now - Duration::minutes(1)).await;
    r.booking.start(booking_id, now).await.unwrap();

    let closed = r
        .conversation
        .close_conversation(CloseConversation::new(booking_id, CloseReason::Refund, now))
        .await
        .unwrap();
    assert_eq!(closed.booking_status, BookingStatus::Refunded);
    assert_eq!(closed.conversation_id, Some(conversation_id));
    assert_eq!(closed.credited_amount, None);
    assert_eq!(balance(&pool).await, 0);

    // 支払い済みの支払いはそのまま残る
    let booking = r.booking.find_by_id(booking_id).await.unwrap().unwrap();
    assert_eq!(booking.payment.map(|p| p.status), Some(PaymentStatus::Paid));
    let conversation = r.conversation.find_by_id(conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.status, ConversationStatus::Closed);
}

// 同時に終了しても成功するのは 1 件だけで、加算も 1 回だけ
#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn concurrent_closes_credit_stylist_once(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let (booking_id, _) = schedule(&r, "STLST13", now - Duration::minutes(1)).await;
    r.booking.start(booking_id, now).await.unwrap();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let conversations = ConversationRepositoryImpl::new(ConnectionPool::new(pool.clone()));
            let reason = if i % 2 == 0 {
                CloseReason::Manual
            } else {
                CloseReason::Expired
            };
            tokio::spawn(async move {
                conversations
                    .close_conversation(CloseConversation::new(booking_id, reason, now))
                    .await
            })
        })
        .collect();

    let mut closed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(c) => {
                assert_eq!(c.credited_amount, Some(AMOUNT));
                closed += 1;
            }
            Err(e) => assert!(matches!(e, AppError::Conflict(_)), "{e:?}"),
        }
    }
    assert_eq!(closed, 1);
    assert_eq!(balance(&pool).await, AMOUNT);
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn expired_conversation_is_found_after_end_time(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let (booking_id, conversation_id) = schedule(&r, "STLST8", now - Duration::hours(1)).await;

    let end = now - Duration::minutes(30);
    assert!(r.conversation.find_expired(end).await.unwrap().is_empty());

    let expired = r.conversation.find_expired(now).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].conversation_id, conversation_id);
    assert_eq!(expired[0].booking_id, booking_id);
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn messages_require_membership_and_open_window(pool: PgPool) {
    let r = repos(&pool);
    let now = Utc::now();
    let (_, conversation_id) = schedule(&r, "STLST9", now - Duration::minutes(5)).await;

    let outsider = r
        .conversation
        .post_message(CreateMessage::new(conversation_id, OUTSIDER, "hi".into(), None, None, now))
        .await;
    assert!(matches!(outsider, Err(AppError::ForbiddenOperation)));

    let late = r
        .conversation
        .post_message(CreateMessage::new(
            conversation_id,
            CUSTOMER,
            "late".into(),
            None,
            None,
            now + Duration::hours(1),
        ))
        .await;
    assert!(matches!(late, Err(AppError::Conflict(_))));

    let posted = r
        .conversation
        .post_message(CreateMessage::new(conversation_id, STYLIST_USER, "halo".into(), None, None, now))
        .await
        .unwrap();
    assert_eq!(posted.user_id, STYLIST_USER);

    let messages = r.conversation.find_messages(conversation_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_text, "halo");

    let listed = r.conversation.find_by_user_id(CUSTOMER).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(r.conversation.find_by_user_id(OUTSIDER).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn unknown_payment_is_not_found(pool: PgPool) {
    let r = repos(&pool);
    let res = r.payment.expire(PaymentId::new(999), Utc::now()).await;
    assert!(matches!(res, Err(AppError::EntityNotFound(_))));
}
