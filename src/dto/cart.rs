use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::fields, models::CartItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(alias = "product", deserialize_with = "fields::id")]
    pub product_id: i64,
    /// Defaults to 1; an unparsable value counts as absent.
    #[serde(default, deserialize_with = "fields::quantity")]
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    #[serde(default, deserialize_with = "fields::quantity")]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<CartItem>)]
    pub items: Vec<CartItem>,
}
