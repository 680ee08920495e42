use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::fields, models::WishlistItem};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddWishlistItemRequest {
    #[serde(alias = "product", deserialize_with = "fields::id")]
    pub product_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct WishlistList {
    #[schema(value_type = Vec<WishlistItem>)]
    pub items: Vec<WishlistItem>,
}
