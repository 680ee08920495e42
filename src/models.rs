use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::{
    categories::{self, CategoryName},
    orders::OrderStatus,
    payments,
    products::{self, AgeRange},
    sellers, user_profiles, users,
};

/// Buyer identity embedded in an order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Customer {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<users::Model> for Customer {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: CategoryName,
    pub slug: String,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub seller: Option<i64>,
    pub category: Category,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub original_price: Option<Decimal>,
    pub discount_percentage: i64,
    pub rating: f64,
    pub review_count: i32,
    pub age_range: AgeRange,
    pub is_new: bool,
    pub is_sale: bool,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(model: products::Model, category: categories::Model) -> Self {
        Self {
            id: model.id,
            seller: model.seller_id,
            category: category.into(),
            discount_percentage: discount_percentage(model.price, model.original_price),
            name: model.name,
            slug: model.slug,
            description: model.description,
            price: model.price,
            original_price: model.original_price,
            rating: model.rating,
            review_count: model.review_count,
            age_range: model.age_range,
            is_new: model.is_new,
            is_sale: model.is_sale,
            location: model.location,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Whole-number percentage off the original price, rounded half to even.
/// Zero unless an original price above the current price is set.
pub fn discount_percentage(price: Decimal, original_price: Option<Decimal>) -> i64 {
    match original_price {
        Some(original) if original > price && !original.is_zero() => {
            ((original - price) / original * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .to_i64()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartItem {
    pub id: i64,
    pub product: Product,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WishlistItem {
    pub id: i64,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    pub product: Product,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price_at_purchase: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Payment {
    pub id: i64,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            amount: model.amount,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            transaction_id: model.transaction_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Order {
    pub id: i64,
    /// Sum of `price_at_purchase * quantity` over the order's lines.
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub order_items: Vec<OrderItem>,
    pub payment: Option<Payment>,
    pub customer: Customer,
}

/// Exact total over `(unit price, quantity)` lines.
pub fn line_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| price * Decimal::from(quantity))
        .sum()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Profile {
    pub id: i64,
    pub user: i64,
    pub fname: String,
    pub lname: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub email: String,
}

impl Profile {
    pub fn from_entity(model: user_profiles::Model, email: String) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            fname: model.fname,
            lname: model.lname,
            phone: model.phone,
            address: model.address,
            city: model.city,
            zip_code: model.zip_code,
            email,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SellerAccount {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Seller {
    pub id: i64,
    pub shop_name: String,
    pub phone_number: String,
    pub address: String,
    pub website: String,
    pub bio: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: SellerAccount,
}

impl Seller {
    pub fn from_entity(model: sellers::Model, user: &users::Model) -> Self {
        Self {
            id: model.id,
            shop_name: model.shop_name,
            phone_number: model.phone_number,
            address: model.address,
            website: model.website,
            bio: model.bio,
            profile_image: model.profile_image,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            user: SellerAccount {
                username: user.username.clone(),
                email: user.email.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn discount_is_rounded_percentage_off_original() {
        assert_eq!(discount_percentage(dec!(75.00), Some(dec!(100.00))), 25);
        assert_eq!(discount_percentage(dec!(19.99), Some(dec!(29.99))), 33);
        assert_eq!(discount_percentage(dec!(2.00), Some(dec!(3.00))), 33);
    }

    #[test]
    fn discount_rounds_half_to_even() {
        // 12.5% and 37.5% off
        assert_eq!(discount_percentage(dec!(87.50), Some(dec!(100.00))), 12);
        assert_eq!(discount_percentage(dec!(62.50), Some(dec!(100.00))), 38);
    }

    #[test]
    fn no_discount_without_a_higher_original_price() {
        assert_eq!(discount_percentage(dec!(10.00), None), 0);
        assert_eq!(discount_percentage(dec!(10.00), Some(dec!(10.00))), 0);
        assert_eq!(discount_percentage(dec!(10.00), Some(dec!(8.00))), 0);
    }

    #[test]
    fn line_total_is_exact() {
        let total = line_total([(dec!(10.00), 2), (dec!(5.00), 1)]);
        assert_eq!(total, dec!(25.00));

        let total = line_total([(dec!(0.10), 3), (dec!(0.20), 1)]);
        assert_eq!(total, dec!(0.50));
    }
}
