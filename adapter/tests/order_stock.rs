// PostgreSQL が必要なため既定では実行しない

use adapter::{
    database::ConnectionPool,
    repository::{order::OrderRepositoryImpl, payment::PaymentRepositoryImpl},
};
use chrono::{Duration, Utc};
use kernel::{
    model::{
        id::{ProductId, UserId},
        order::{
            event::{CreateOrder, CreateOrderItem},
            OrderStatus,
        },
        payment::PaymentOwner,
    },
    repository::{order::OrderRepository, payment::PaymentRepository},
};
use shared::error::AppError;
use sqlx::PgPool;

async fn stock(pool: &PgPool, product_id: i64, size: &str) -> i32 {
    let (stock,): (i32,) =
        sqlx::query_as("SELECT stock FROM product_sizes WHERE product_id = $1 AND size = $2")
            .bind(product_id)
            .bind(size)
            .fetch_one(pool)
            .await
            .unwrap();
    stock
}

fn order(number: &str, items: Vec<CreateOrderItem>, deadline_in: Duration) -> CreateOrder {
    CreateOrder::new(
        number.into(),
        UserId::new(1),
        items,
        None,
        42,
        Utc::now() + deadline_in,
    )
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn expired_order_restores_stock(pool: PgPool) {
    let db = ConnectionPool::new(pool.clone());
    let orders = OrderRepositoryImpl::new(db.clone());
    let payments = PaymentRepositoryImpl::new(db);

    let created = orders
        .create(order(
            "ORD1",
            vec![
                CreateOrderItem::new(ProductId::new(2), "M".into(), 1),
                CreateOrderItem::new(ProductId::new(1), "M".into(), 3),
            ],
            Duration::seconds(-1),
        ))
        .await
        .unwrap();
    assert_eq!(created.total, 3 * 100_000 + 250_000);
    assert_eq!(created.payment.as_ref().and_then(|p| p.transfer_amount), Some(550_042));
    assert_eq!(created.items.len(), 2);
    assert_eq!(stock(&pool, 1, "M").await, 2);
    assert_eq!(stock(&pool, 2, "M").await, 0);

    let payment_id = created.payment.unwrap().payment_id;
    let owner = payments.expire(payment_id, Utc::now()).await.unwrap();
    assert_eq!(owner, Some(PaymentOwner::Order(created.order_id)));

    let cancelled = orders.find_by_id(created.order_id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock(&pool, 1, "M").await, 5);
    assert_eq!(stock(&pool, 2, "M").await, 1);

    // 二度目の失効で在庫が二重に戻らない
    assert_eq!(payments.expire(payment_id, Utc::now()).await.unwrap(), None);
    assert_eq!(stock(&pool, 1, "M").await, 5);
}

#[sqlx::test(migrations = "./migrations", fixtures("common"))]
#[ignore]
async fn insufficient_stock_rolls_back(pool: PgPool) {
    let orders = OrderRepositoryImpl::new(ConnectionPool::new(pool.clone()));

    let res = orders
        .create(order(
            "ORD2",
            vec![
                CreateOrderItem::new(ProductId::new(1), "M".into(), 1),
                CreateOrderItem::new(ProductId::new(1), "L".into(), 3),
            ],
            Duration::minutes(30),
        ))
        .await;
    assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));
    assert_eq!(stock(&pool, 1, "M").await, 5);
    assert_eq!(stock(&pool, 1, "L").await, 2);

    let empty = orders.create(order("ORD3", vec![], Duration::minutes(30))).await;
    assert!(matches!(empty, Err(AppError::UnprocessableEntity(_))));
}
