use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::fields, entity::products::AgeRange, models::Product};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    pub category_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub original_price: Option<Decimal>,
    pub age_range: AgeRange,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    /// `null` clears it.
    #[serde(default, deserialize_with = "fields::nullable")]
    #[schema(value_type = Option<String>)]
    pub original_price: Option<Option<Decimal>>,
    pub age_range: Option<AgeRange>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    /// `null` clears it.
    #[serde(default, deserialize_with = "fields::nullable")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn update_distinguishes_clearing_from_leaving_alone() {
        let untouched: UpdateProductRequest = serde_json::from_str(r#"{"name": "Kite"}"#).unwrap();
        assert_eq!(untouched.original_price, None);
        assert_eq!(untouched.location, None);

        let cleared: UpdateProductRequest =
            serde_json::from_str(r#"{"original_price": null, "location": null}"#).unwrap();
        assert_eq!(cleared.original_price, Some(None));
        assert_eq!(cleared.location, Some(None));

        let set: UpdateProductRequest =
            serde_json::from_str(r#"{"original_price": "12.50", "location": "Pune"}"#).unwrap();
        assert_eq!(set.original_price, Some(Some(dec!(12.50))));
        assert_eq!(set.location, Some(Some("Pune".to_string())));
    }
}
