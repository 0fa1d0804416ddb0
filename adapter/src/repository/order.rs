use crate::database::{
    model::order::{OrderItemRow, OrderRow},
    to_column_precision, ConnectionPool,
};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{OrderId, PaymentId},
    order::{
        event::{CreateOrder, CreateOrderItem},
        Order, OrderItem, OrderStatus,
    },
    payment::PaymentStatus,
};
use kernel::repository::order::OrderRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct OrderRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl OrderRepository for OrderRepositoryImpl {
    async fn create(&self, event: CreateOrder) -> AppResult<Order> {
        if event.items.is_empty() {
            return Err(AppError::UnprocessableEntity(
                "注文する商品がありません。".into(),
            ));
        }

        // 在庫行のロック順を揃えるため、商品 ID とサイズで並べてから確保する
        let mut items: Vec<CreateOrderItem> = event.items;
        items.sort_by(|a, b| (a.product_id, &a.size).cmp(&(b.product_id, &b.size)));

        let mut tx = self.db.begin().await?;

        let mut total: i64 = 0;
        for item in &items {
            let reserved: Option<(i64,)> = sqlx::query_as(
                r#"
                    UPDATE product_sizes AS ps
                    SET stock = ps.stock - $3
                    FROM products AS p
                    WHERE p.product_id = ps.product_id
                      AND ps.product_id = $1
                      AND ps.size = $2
                      AND ps.stock >= $3
                    RETURNING p.product_price
                "#,
            )
            .bind(item.product_id)
            .bind(&item.size)
            .bind(item.quantity)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            let Some((price,)) = reserved else {
                return Err(AppError::UnprocessableEntity(format!(
                    "商品（{}）のサイズ {} の在庫が不足しています。",
                    item.product_id, item.size
                )));
            };
            total = price
                .checked_mul(i64::from(item.quantity))
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| AppError::UnprocessableEntity("合計金額が大きすぎます。".into()))?;
        }

        let (payment_id,): (PaymentId,) = sqlx::query_as(
            r#"
                INSERT INTO payment_details
                (amount, transfer_amount, provider, payment_status, payment_deadline)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING payment_id
            "#,
        )
        .bind(total)
        .bind(total + event.transfer_suffix)
        .bind(event.provider.as_deref())
        .bind(PaymentStatus::Pending.as_ref())
        .bind(to_column_precision(event.payment_deadline))
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let (order_id,): (OrderId,) = sqlx::query_as(
            r#"
                INSERT INTO orders (order_number, user_id, payment_id, total, order_status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING order_id
            "#,
        )
        .bind(&event.order_number)
        .bind(event.user_id)
        .bind(payment_id)
        .bind(total)
        .bind(OrderStatus::Pending.as_ref())
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        for item in &items {
            sqlx::query(
                r#"
                    INSERT INTO order_items (order_id, product_id, size, quantity)
                    VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.size)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::info!(
            order.id = %order_id,
            order.number = %event.order_number,
            order.total = total,
            "order created"
        );

        self.find_by_id(order_id).await?.ok_or_else(|| {
            AppError::NoRowsAffectedError(format!("order {order_id} disappeared after write"))
        })
    }

    async fn find_by_id(&self, order_id: OrderId) -> AppResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
                SELECT
                    o.order_id,
                    o.order_number,
                    o.user_id,
                    o.order_status,
                    o.total,
                    o.created_at,
                    p.payment_id,
                    p.amount,
                    p.transfer_amount,
                    p.provider,
                    p.payment_status,
                    p.payment_deadline,
                    p.payment_date
                FROM orders AS o
                LEFT JOIN payment_details AS p ON o.payment_id = p.payment_id
                WHERE o.order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<OrderItemRow> = sqlx::query_as(
            r#"
                SELECT order_item_id, product_id, size, quantity
                FROM order_items
                WHERE order_id = $1
                ORDER BY order_item_id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.into_order(items.into_iter().map(OrderItem::from).collect())
            .map(Some)
    }
}
