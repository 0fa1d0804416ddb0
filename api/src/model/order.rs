use chrono::{DateTime, Duration, Utc};
use garde::Validate;
use kernel::model::{
    booking::generate_reference_number,
    id::{OrderId, OrderItemId, ProductId, UserId},
    order::{
        event::{CreateOrder, CreateOrderItem},
        Order, OrderItem, ORDER_NUMBER_PREFIX,
    },
    payment::{payment_deadline, transfer_suffix},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::config::BookingConfig;

use super::payment::PaymentResponse;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    #[garde(skip)]
    pub product_id: ProductId,
    #[garde(length(min = 1, max = 16))]
    pub size: String,
    #[garde(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[garde(length(min = 1), dive)]
    pub items: Vec<CreateOrderItemRequest>,
    #[garde(length(min = 1, max = 64))]
    pub provider: Option<String>,
}

impl CreateOrderRequest {
    // 支払期限は予約と同じ長さ
    pub fn into_event<R: Rng + ?Sized>(
        self,
        user_id: UserId,
        config: &BookingConfig,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> CreateOrder {
        let CreateOrderRequest { items, provider } = self;
        let items = items
            .into_iter()
            .map(|i| CreateOrderItem::new(i.product_id, i.size, i.quantity))
            .collect();
        CreateOrder::new(
            generate_reference_number(ORDER_NUMBER_PREFIX, now, rng),
            user_id,
            items,
            provider,
            transfer_suffix(rng),
            payment_deadline(now, Duration::minutes(config.payment_window_minutes)),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(value: OrderItem) -> Self {
        let OrderItem {
            order_item_id,
            product_id,
            size,
            quantity,
        } = value;
        Self {
            order_item_id,
            product_id,
            size,
            quantity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: String,
    pub total: i64,
    pub payment: Option<PaymentResponse>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(value: Order) -> Self {
        let Order {
            order_id,
            order_number,
            user_id,
            status,
            total,
            payment,
            items,
            created_at,
        } = value;
        Self {
            order_id,
            order_number,
            user_id,
            status: status.to_string(),
            total,
            payment: payment.map(PaymentResponse::from),
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    fn item(size: &str, quantity: i32) -> CreateOrderItemRequest {
        CreateOrderItemRequest {
            product_id: ProductId::new(1),
            size: size.into(),
            quantity,
        }
    }

    #[rstest]
    #[case(vec![item("M", 1)], true)]
    #[case(vec![], false)]
    #[case(vec![item("M", 0)], false)]
    #[case(vec![item("", 1)], false)]
    fn validates_items(#[case] items: Vec<CreateOrderItemRequest>, #[case] valid: bool) {
        let req = CreateOrderRequest {
            items,
            provider: None,
        };
        assert_eq!(req.validate(&()).is_ok(), valid);
    }

    #[test]
    fn builds_order_event() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(3);
        let req = CreateOrderRequest {
            items: vec![item("M", 2), item("L", 1)],
            provider: Some("bank_transfer".into()),
        };
        let event = req.into_event(UserId::new(1), &BookingConfig::default(), now, &mut rng);

        assert!(event.order_number.starts_with("ORD"));
        assert_eq!(event.items.len(), 2);
        assert!((0..1000).contains(&event.transfer_suffix));
        assert_eq!(event.payment_deadline, now + Duration::minutes(30));
    }
}
