use crate::database::{
    model::{
        parse_status,
        payment::{owner_of, ExpiredPaymentRow},
    },
    ConnectionPool,
};
use crate::repository::conversation::close_open_conversation_without_credit;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::model::{
    id::{BookingId, OrderId, PaymentId},
    payment::{ExpiredPayment, PaymentOwner, PaymentStatus},
};
use kernel::repository::payment::PaymentRepository;
use shared::error::{AppError, AppResult};
use sqlx::{Postgres, Transaction};

const EXPIRED_PAYMENT_SELECT: &str = r#"
    SELECT
        p.payment_id,
        p.payment_deadline,
        b.booking_id,
        o.order_id
    FROM payment_details AS p
    LEFT JOIN bookings AS b ON b.payment_id = p.payment_id
    LEFT JOIN orders AS o ON o.payment_id = p.payment_id
"#;

#[derive(new)]
pub struct PaymentRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl PaymentRepository for PaymentRepositoryImpl {
    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<ExpiredPayment>> {
        let sql = format!(
            "{EXPIRED_PAYMENT_SELECT}
            WHERE p.payment_status = $1 AND p.payment_deadline <= $2
            ORDER BY p.payment_deadline ASC"
        );
        let rows: Vec<ExpiredPaymentRow> = sqlx::query_as(&sql)
            .bind(PaymentStatus::Pending.as_ref())
            .bind(now)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        // 持ち主を特定できない行は飛ばして残りを処理する
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let payment_id = row.payment_id;
                ExpiredPayment::try_from(row)
                    .inspect_err(|e| {
                        tracing::warn!(payment.id = %payment_id, error.message = %e, "skip payment")
                    })
                    .ok()
            })
            .collect())
    }

    async fn expire(
        &self,
        payment_id: PaymentId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PaymentOwner>> {
        let sql = format!("{EXPIRED_PAYMENT_SELECT} WHERE p.payment_id = $1");
        let row: Option<ExpiredPaymentRow> = sqlx::query_as(&sql)
            .bind(payment_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "支払い（{payment_id}）が見つかりませんでした。"
            )));
        };
        let owner = owner_of(row.payment_id, row.booking_id, row.order_id)?;

        let mut tx = self.db.begin().await?;

        // ロック順: 持ち主 -> 支払い -> 会話 / 在庫
        lock_owner(&mut tx, owner).await?;

        let locked: (String, DateTime<Utc>) = sqlx::query_as(
            r#"
                SELECT payment_status, payment_deadline
                FROM payment_details
                WHERE payment_id = $1
                FOR UPDATE
            "#,
        )
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let status: PaymentStatus = parse_status(&locked.0, "payment_status")?;
        if status != PaymentStatus::Pending || locked.1 > now {
            // 別の処理が先に支払い確認または失効させた
            tracing::debug!(payment.id = %payment_id, %status, "payment no longer overdue");
            return Ok(None);
        }

        sqlx::query(
            r#"
                UPDATE payment_details
                SET payment_status = $2
                WHERE payment_id = $1 AND payment_status = $3
            "#,
        )
        .bind(payment_id)
        .bind(PaymentStatus::Failed.as_ref())
        .bind(PaymentStatus::Pending.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        cancel_owner(&mut tx, owner).await?;

        match owner {
            PaymentOwner::Booking(booking_id) => {
                if let Some(conversation_id) =
                    close_open_conversation_without_credit(&mut tx, booking_id, now).await?
                {
                    tracing::info!(
                        booking.id = %booking_id,
                        conversation.id = %conversation_id,
                        "conversation closed without credit"
                    );
                }
            }
            PaymentOwner::Order(order_id) => restore_stock(&mut tx, order_id).await?,
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(payment.id = %payment_id, %owner, "payment expired");
        Ok(Some(owner))
    }
}

// 持ち主ごとのテーブル名と列名。いずれも固定文字列
fn owner_table(owner: PaymentOwner) -> (&'static str, &'static str, &'static str) {
    match owner {
        PaymentOwner::Booking(_) => ("bookings", "booking_id", "status"),
        PaymentOwner::Order(_) => ("orders", "order_id", "order_status"),
    }
}

async fn lock_owner(tx: &mut Transaction<'_, Postgres>, owner: PaymentOwner) -> AppResult<()> {
    let (table, id_column, _) = owner_table(owner);
    let sql = format!("SELECT {id_column} FROM {table} WHERE {id_column} = $1 FOR UPDATE");
    sqlx::query(&sql)
        .bind(owner.raw_id())
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)?
        .map(|_| ())
        .ok_or_else(|| AppError::EntityNotFound(format!("{owner} が見つかりませんでした。")))
}

async fn cancel_owner(tx: &mut Transaction<'_, Postgres>, owner: PaymentOwner) -> AppResult<()> {
    let (table, id_column, status_column) = owner_table(owner);
    let sql = format!(
        "UPDATE {table} SET {status_column} = $2 WHERE {id_column} = $1 AND {status_column} = ANY($3)"
    );
    let res = sqlx::query(&sql)
        .bind(owner.raw_id())
        .bind(owner.cancelled_status())
        .bind(owner.cancellable_statuses())
        .execute(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

    if res.rows_affected() < 1 {
        return Err(AppError::Conflict(format!(
            "{owner} は支払期限切れで取り消せる状態ではありません。"
        )));
    }
    Ok(())
}

// 予約の支払いが pending のままなら failed にする。返金と同じトランザクションで呼ぶ
pub(crate) async fn fail_pending_payment(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
) -> AppResult<Option<PaymentId>> {
    let failed: Option<(PaymentId,)> = sqlx::query_as(
        r#"
            UPDATE payment_details AS p
            SET payment_status = $2
            FROM bookings AS b
            WHERE b.booking_id = $1
              AND p.payment_id = b.payment_id
              AND p.payment_status = $3
            RETURNING p.payment_id
        "#,
    )
    .bind(booking_id)
    .bind(PaymentStatus::Failed.as_ref())
    .bind(PaymentStatus::Pending.as_ref())
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;
    Ok(failed.map(|(payment_id,)| payment_id))
}

// 注文で確保した在庫を戻す
async fn restore_stock(tx: &mut Transaction<'_, Postgres>, order_id: OrderId) -> AppResult<()> {
    sqlx::query(
        r#"
            UPDATE product_sizes AS ps
            SET stock = ps.stock + agg.quantity
            FROM (
                SELECT product_id, size, SUM(quantity)::INTEGER AS quantity
                FROM order_items
                WHERE order_id = $1
                GROUP BY product_id, size
            ) AS agg
            WHERE ps.product_id = agg.product_id AND ps.size = agg.size
        "#,
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::SpecificOperationError)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_tables_are_fixed() {
        assert_eq!(
            owner_table(PaymentOwner::Booking(BookingId::new(1))),
            ("bookings", "booking_id", "status")
        );
        assert_eq!(
            owner_table(PaymentOwner::Order(OrderId::new(1))),
            ("orders", "order_id", "order_status")
        );
    }
}
