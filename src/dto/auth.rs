use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 150, message = "First name required"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct LoginOtpRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 10, message = "Enter the code from the email"))]
    pub otp: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PasswordLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RefreshRequest {
    /// Fallback when the refresh cookie is not sent.
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpDispatched {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub token_type: TokenKind,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}
