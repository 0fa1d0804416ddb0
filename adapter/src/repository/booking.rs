use crate::database::{
    model::{
        booking::{BookingLockRow, BookingRow},
        parse_status,
    },
    to_column_precision, ConnectionPool,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::model::{
    booking::{
        event::{ConfirmBookingPayment, CreateBooking},
        status::{BookingStatus, BookingTransition},
        Booking,
    },
    id::{BookingId, PaymentId, UserId},
    payment::PaymentStatus,
};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};
use sqlx::{Postgres, Transaction};

// bookings に stylists と payment_details を結合した共通の SELECT 句
const BOOKING_SELECT: &str = r#"
    SELECT
        b.booking_id,
        b.booking_number,
        b.customer_id,
        b.stylist_id,
        s.user_id AS stylist_user_id,
        s.brand_name,
        b.booking_date,
        b.booking_time,
        b.scheduled_at,
        b.status,
        b.is_reviewed,
        b.created_at,
        p.payment_id,
        p.amount,
        p.transfer_amount,
        p.provider,
        p.payment_status,
        p.payment_deadline,
        p.payment_date
    FROM bookings AS b
    INNER JOIN stylists AS s ON b.stylist_id = s.stylist_id
    LEFT JOIN payment_details AS p ON b.payment_id = p.payment_id
"#;

#[derive(new)]
pub struct BookingRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn create(&self, event: CreateBooking) -> AppResult<Booking> {
        let mut tx = self.db.begin().await?;

        // スタイリストの存在確認
        let stylist: Option<(i64,)> =
            sqlx::query_as("SELECT stylist_id FROM stylists WHERE stylist_id = $1")
                .bind(event.stylist_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::SpecificOperationError)?;
        if stylist.is_none() {
            return Err(AppError::EntityNotFound(format!(
                "スタイリスト（{}）が見つかりませんでした。",
                event.stylist_id
            )));
        }

        // 支払いレコードを先に作り、予約から参照する
        let (payment_id,): (PaymentId,) = sqlx::query_as(
            r#"
                INSERT INTO payment_details
                (amount, transfer_amount, provider, payment_status, payment_deadline)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING payment_id
            "#,
        )
        .bind(event.amount)
        .bind(event.transfer_amount)
        .bind(event.provider.as_deref())
        .bind(PaymentStatus::Pending.as_ref())
        .bind(to_column_precision(event.payment_deadline))
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let (booking_id,): (BookingId,) = sqlx::query_as(
            r#"
                INSERT INTO bookings
                (booking_number, customer_id, stylist_id, payment_id,
                booking_date, booking_time, scheduled_at, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING booking_id
            "#,
        )
        .bind(&event.booking_number)
        .bind(event.customer_id)
        .bind(event.stylist_id)
        .bind(payment_id)
        .bind(event.slot.date)
        .bind(event.slot.time)
        .bind(to_column_precision(event.scheduled_at))
        .bind(BookingStatus::Pending.as_ref())
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(
            booking.id = %booking_id,
            booking.number = %event.booking_number,
            payment.deadline = %event.payment_deadline,
            "booking created"
        );

        self.fetch_existing(booking_id).await
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.booking_id = $1");
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn find_by_customer_id(&self, customer_id: UserId) -> AppResult<Vec<Booking>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.customer_id = $1 ORDER BY b.created_at DESC");
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(customer_id)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn find_active_by_stylist_user_id(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        let sql = format!(
            "{BOOKING_SELECT} WHERE s.user_id = $1 AND b.status <> ALL($2) ORDER BY b.scheduled_at DESC"
        );
        let hidden = vec![
            BookingStatus::Pending.to_string(),
            BookingStatus::Cancelled.to_string(),
        ];
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(user_id)
            .bind(&hidden)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn confirm_payment(&self, event: ConfirmBookingPayment) -> AppResult<Booking> {
        let mut tx = self.db.begin().await?;

        let booking = lock_booking(&mut tx, event.booking_id).await?;
        let current: BookingStatus = parse_status(&booking.status, "bookings.status")?;
        let next = current.apply(BookingTransition::PaymentConfirmed)?;

        // ロック順は 予約 -> 支払い で統一する
        let payment: Option<(PaymentId, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
                SELECT p.payment_id, p.payment_status, p.payment_deadline
                FROM payment_details AS p
                INNER JOIN bookings AS b ON b.payment_id = p.payment_id
                WHERE b.booking_id = $1
                FOR UPDATE OF p
            "#,
        )
        .bind(event.booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some((payment_id, payment_status, payment_deadline)) = payment else {
            return Err(AppError::EntityNotFound(format!(
                "予約（{}）の支払い情報が見つかりませんでした。",
                event.booking_id
            )));
        };
        let payment_status: PaymentStatus = parse_status(&payment_status, "payment_status")?;
        if payment_status != PaymentStatus::Pending {
            return Err(AppError::Conflict(format!(
                "支払い（{payment_id}）はすでに {payment_status} です。"
            )));
        }
        if payment_deadline <= event.paid_at {
            return Err(AppError::Conflict(format!(
                "支払い（{payment_id}）は支払期限 {payment_deadline} を過ぎています。"
            )));
        }

        let res = sqlx::query(
            r#"
                UPDATE payment_details
                SET payment_status = $2, payment_date = $3
                WHERE payment_id = $1 AND payment_status = $4
            "#,
        )
        .bind(payment_id)
        .bind(PaymentStatus::Paid.as_ref())
        .bind(event.paid_at)
        .bind(PaymentStatus::Pending.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;
        if res.rows_affected() < 1 {
            return Err(AppError::Conflict(format!(
                "支払い（{payment_id}）は他の処理で更新されました。"
            )));
        }

        if next != current {
            transition_booking(&mut tx, event.booking_id, current, next).await?;
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        self.fetch_existing(event.booking_id).await
    }

    async fn accept(&self, booking_id: BookingId) -> AppResult<Booking> {
        let mut tx = self.db.begin().await?;

        let booking = lock_booking(&mut tx, booking_id).await?;
        let current: BookingStatus = parse_status(&booking.status, "bookings.status")?;
        let next = current.apply(BookingTransition::Accept)?;
        transition_booking(&mut tx, booking_id, current, next).await?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        self.fetch_existing(booking_id).await
    }

    async fn find_ready_to_schedule(&self) -> AppResult<Vec<BookingId>> {
        let rows: Vec<(BookingId,)> = sqlx::query_as(
            r#"
                SELECT b.booking_id
                FROM bookings AS b
                INNER JOIN payment_details AS p ON b.payment_id = p.payment_id
                WHERE b.status = $1 AND p.payment_status = $2
                ORDER BY b.scheduled_at ASC
            "#,
        )
        .bind(BookingStatus::Accepted.as_ref())
        .bind(PaymentStatus::Paid.as_ref())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_due_to_start(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingId>> {
        // 支払いの無い予約は期限駆動の遷移の対象外
        let rows: Vec<(BookingId,)> = sqlx::query_as(
            r#"
                SELECT booking_id
                FROM bookings
                WHERE status = $1
                  AND payment_id IS NOT NULL
                  AND scheduled_at <= $2
                ORDER BY scheduled_at ASC
            "#,
        )
        .bind(BookingStatus::Scheduled.as_ref())
        .bind(now)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn start(&self, booking_id: BookingId, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let booking = lock_booking(&mut tx, booking_id).await?;
        if booking.scheduled_at > now {
            return Err(AppError::Conflict(format!(
                "予約（{booking_id}）はまだ開始時刻（{}）になっていません。",
                booking.scheduled_at
            )));
        }
        let current: BookingStatus = parse_status(&booking.status, "bookings.status")?;
        let next = current.apply(BookingTransition::Start)?;
        transition_booking(&mut tx, booking_id, current, next).await?;

        tx.commit().await.map_err(AppError::TransactionError)?;
        Ok(())
    }
}

impl BookingRepositoryImpl {
    // 書き込み直後の再取得。見つからなければ不整合
    async fn fetch_existing(&self, booking_id: BookingId) -> AppResult<Booking> {
        self.find_by_id(booking_id).await?.ok_or_else(|| {
            AppError::NoRowsAffectedError(format!("booking {booking_id} disappeared after write"))
        })
    }
}

// 予約行を FOR UPDATE でロックして取得する
// 支払い・会話・残高に触れる処理はすべて最初にこれを呼ぶ
pub(crate) async fn lock_booking(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
) -> AppResult<BookingLockRow> {
    sqlx::query_as::<_, BookingLockRow>(
        r#"
            SELECT
                b.booking_id,
                b.status,
                b.stylist_id,
                s.user_id AS stylist_user_id,
                b.customer_id,
                b.scheduled_at,
                p.amount,
                p.payment_status
            FROM bookings AS b
            INNER JOIN stylists AS s ON b.stylist_id = s.stylist_id
            LEFT JOIN payment_details AS p ON b.payment_id = p.payment_id
            WHERE b.booking_id = $1
            FOR UPDATE OF b
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?
    .ok_or_else(|| AppError::EntityNotFound(format!("予約（{booking_id}）が見つかりませんでした。")))
}

// 期待するステータスのときだけ更新する。他の処理に先を越された場合は Conflict
pub(crate) async fn transition_booking(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
    from: BookingStatus,
    to: BookingStatus,
) -> AppResult<()> {
    let res = sqlx::query(
        r#"
            UPDATE bookings
            SET status = $3
            WHERE booking_id = $1 AND status = $2
        "#,
    )
    .bind(booking_id)
    .bind(from.as_ref())
    .bind(to.as_ref())
    .execute(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;

    if res.rows_affected() < 1 {
        return Err(AppError::Conflict(format!(
            "予約（{booking_id}）のステータスは {from} ではなくなっています。"
        )));
    }

    tracing::debug!(booking.id = %booking_id, %from, %to, "booking status changed");
    Ok(())
}
