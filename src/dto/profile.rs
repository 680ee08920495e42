use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Partial update; absent fields keep their value.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 150))]
    pub fname: Option<String>,
    #[validate(length(max = 150))]
    pub lname: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
}
