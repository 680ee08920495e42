use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::fields, entity::orders::OrderStatus, models::Order};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    #[serde(alias = "product", deserialize_with = "fields::id")]
    pub product_id: i64,
    /// Defaults to 1; an unparsable value counts as absent.
    #[serde(default, deserialize_with = "fields::quantity")]
    pub quantity: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePaymentIntentRequest {
    #[serde(default, deserialize_with = "fields::optional_id")]
    pub order_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub order_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}
