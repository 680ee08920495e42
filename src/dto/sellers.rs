use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidateUrl, ValidationError};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SellerSignupRequest {
    /// Defaults to the email address.
    pub username: Option<String>,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub shop_name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    #[validate(custom(function = "blank_or_url"))]
    pub website: String,
    #[serde(default)]
    pub bio: String,
    #[validate(url(message = "Enter a valid URL"))]
    pub profile_image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateSellerRequest {
    #[validate(length(max = 255))]
    pub shop_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub website: Option<String>,
    pub bio: Option<String>,
    #[validate(url(message = "Enter a valid URL"))]
    pub profile_image: Option<String>,
}

fn blank_or_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.to_string().validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("Enter a valid URL".into()))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub products_listed: u64,
    pub total_orders: u64,
    #[schema(value_type = String)]
    pub total_earnings: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_may_be_blank_or_a_url() {
        assert!(blank_or_url("").is_ok());
        assert!(blank_or_url("https://toys.example.com").is_ok());
        assert!(blank_or_url("not a url").is_err());
    }
}
