use crate::model::{
    id::OrderId,
    order::{event::CreateOrder, Order},
};
use async_trait::async_trait;
use shared::error::AppResult;

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    // 在庫を確保して注文と支払いレコードを作成する
    async fn create(&self, event: CreateOrder) -> AppResult<Order>;
    async fn find_by_id(&self, order_id: OrderId) -> AppResult<Option<Order>>;
}
