use crate::model::id::{ProductId, UserId};
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(new, Debug)]
pub struct CreateOrder {
    pub order_number: String,
    pub user_id: UserId,
    pub items: Vec<CreateOrderItem>,
    pub provider: Option<String>,
    // 合計金額に足す振込照合用の端数
    pub transfer_suffix: i64,
    pub payment_deadline: DateTime<Utc>,
}

#[derive(new, Debug, Clone)]
pub struct CreateOrderItem {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
}
