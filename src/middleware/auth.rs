use axum::{extract::FromRequestParts, http::header};

use crate::{
    dto::auth::TokenKind,
    error::AppError,
    services::token_service::{claims_user_id, decode_token},
    state::AppState,
};

pub const ROLE_USER: &str = "user";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, ROLE_ADMIN)
}

/// Seller surface; admins are let through as well.
pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    if user.is_admin() {
        return Ok(());
    }
    ensure_role(user, ROLE_SELLER)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let claims = decode_token(&state.config.auth, token, TokenKind::Access)?;
        let user_id = claims_user_id(&claims)?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            user_id: 1,
            role: role.into(),
        }
    }

    #[test]
    fn seller_guard_admits_sellers_and_admins() {
        assert!(ensure_seller(&user(ROLE_SELLER)).is_ok());
        assert!(ensure_seller(&user(ROLE_ADMIN)).is_ok());
        assert!(matches!(ensure_seller(&user(ROLE_USER)), Err(AppError::Forbidden)));
    }

    #[test]
    fn admin_guard_is_exact() {
        assert!(ensure_admin(&user(ROLE_ADMIN)).is_ok());
        assert!(ensure_admin(&user(ROLE_SELLER)).is_err());
    }
}
