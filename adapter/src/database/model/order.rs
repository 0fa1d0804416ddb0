use super::{parse_status, payment::JoinedPaymentRow};
use kernel::model::{
    id::{OrderId, OrderItemId, ProductId, UserId},
    order::{Order, OrderItem},
};
use shared::error::AppResult;
use sqlx::types::chrono::{DateTime, Utc};

#[derive(sqlx::FromRow)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub order_status: String,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub payment: JoinedPaymentRow,
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItem>) -> AppResult<Order> {
        let OrderRow {
            order_id,
            order_number,
            user_id,
            order_status,
            total,
            created_at,
            payment,
        } = self;
        Ok(Order {
            order_id,
            order_number,
            user_id,
            status: parse_status(&order_status, "orders.order_status")?,
            total,
            payment: payment.into_payment()?,
            items,
            created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(value: OrderItemRow) -> Self {
        let OrderItemRow {
            order_item_id,
            product_id,
            size,
            quantity,
        } = value;
        OrderItem {
            order_item_id,
            product_id,
            size,
            quantity,
        }
    }
}
