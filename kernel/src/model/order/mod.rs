use crate::model::{
    id::{OrderId, OrderItemId, ProductId, UserId},
    payment::Payment,
};
use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display, EnumString};

pub mod event;

pub const ORDER_NUMBER_PREFIX: &str = "ORD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    WaitingConfirmation,
    Processing,
    Shipped,
    Delivered,
    Accepted,
    Rejected,
    Done,
    Cancelled,
}

#[derive(Debug)]
pub struct Order {
    pub order_id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: i64,
    pub payment: Option<Payment>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
}
