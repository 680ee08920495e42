use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, sea_query::Expr,
};
use validator::Validate;

use crate::{
    audit::{self, AuditAction},
    config::AuthConfig,
    dto::auth::{
        LoginOtpRequest, OtpDispatched, PasswordLoginRequest, SignupRequest, TokenKind,
        VerifyOtpRequest,
    },
    entity::{
        otps::{ActiveModel as OtpActive, Column as OtpCol, Entity as Otps, Model as OtpModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::ROLE_USER,
    response::{ApiResponse, Meta},
    services::token_service::{self, IssuedSession},
    state::AppState,
};

/// Six digit code drawn uniformly from 100000..=999999.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

pub async fn find_user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(UserCol::Email.eq(email.trim()))
        .one(conn)
        .await?)
}

async fn issue_otp<C: ConnectionTrait>(
    conn: &C,
    auth: &AuthConfig,
    user_id: i64,
) -> AppResult<OtpModel> {
    let now = Utc::now();
    let otp = OtpActive {
        id: NotSet,
        user_id: Set(user_id),
        code: Set(generate_code()),
        created_at: Set(now.into()),
        expires_at: Set((now + auth.otp_ttl).into()),
        verified: Set(false),
    }
    .insert(conn)
    .await?;
    Ok(otp)
}

pub async fn request_signup_otp(
    state: &AppState,
    payload: SignupRequest,
) -> AppResult<ApiResponse<OtpDispatched>> {
    payload.validate()?;
    let email = payload.email.trim().to_string();

    if find_user_by_email(&state.orm, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let user = UserActive {
        id: NotSet,
        email: Set(email.clone()),
        username: Set(email.clone()),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        password_hash: Set(None),
        role: Set(ROLE_USER.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User already exists".into())
        }
        _ => AppError::from(err),
    })?;

    let otp = issue_otp(&state.orm, &state.config.auth, user.id).await?;
    tracing::info!(user_id = user.id, "signup otp issued");

    audit::record(
        &state.orm,
        Some(user.id),
        AuditAction::UserSignup,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    // The account stays even if delivery fails; the user can request a login code.
    state.mailer.send_otp(&email, &otp.code).await?;

    Ok(ApiResponse::success(
        "User created. OTP sent to email.",
        OtpDispatched { email },
        Some(Meta::empty()),
    ))
}

pub async fn request_login_otp(
    state: &AppState,
    payload: LoginOtpRequest,
) -> AppResult<ApiResponse<OtpDispatched>> {
    payload.validate()?;
    let user = find_user_by_email(&state.orm, &payload.email)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    retire_verified_codes(&state.orm, user.id).await?;

    let otp = issue_otp(&state.orm, &state.config.auth, user.id).await?;
    tracing::info!(user_id = user.id, "login otp issued");

    state.mailer.send_otp(&user.email, &otp.code).await?;

    Ok(ApiResponse::success(
        "OTP sent to email. Please verify to login.",
        OtpDispatched { email: user.email },
        Some(Meta::empty()),
    ))
}

/// Flags consumed codes unverified again and pulls their expiry into the past,
/// so the reset can never make a consumed code usable.
async fn retire_verified_codes<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<()> {
    let retired_at = Utc::now() - Duration::seconds(1);
    Otps::update_many()
        .col_expr(OtpCol::Verified, Expr::value(false))
        .col_expr(
            OtpCol::ExpiresAt,
            Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(retired_at)),
        )
        .filter(OtpCol::UserId.eq(user_id))
        .filter(OtpCol::Verified.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}

/// Consumes a matching unexpired code and mints a session for its owner.
pub async fn verify_otp(state: &AppState, payload: VerifyOtpRequest) -> AppResult<IssuedSession> {
    payload.validate()?;
    let user = find_user_by_email(&state.orm, &payload.email)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let candidate = Otps::find()
        .filter(OtpCol::UserId.eq(user.id))
        .filter(OtpCol::Code.eq(payload.otp.trim()))
        .filter(OtpCol::Verified.eq(false))
        .order_by_desc(OtpCol::CreatedAt)
        .order_by_desc(OtpCol::Id)
        .one(&state.orm)
        .await?;

    let otp = match candidate {
        Some(otp) if otp.is_valid_at(Utc::now()) => otp,
        _ => return Err(AppError::InvalidOrExpiredOtp),
    };

    // Conditional flip: of two concurrent verifications only one sees a row change.
    let consumed = Otps::update_many()
        .col_expr(OtpCol::Verified, Expr::value(true))
        .filter(OtpCol::Id.eq(otp.id))
        .filter(OtpCol::Verified.eq(false))
        .exec(&state.orm)
        .await?;
    if consumed.rows_affected == 0 {
        return Err(AppError::InvalidOrExpiredOtp);
    }

    let session = token_service::issue_session(&state.config.auth, user)?;
    tracing::info!(user_id = session.user.id, "otp verified, session issued");

    audit::record(
        &state.orm,
        Some(session.user.id),
        AuditAction::UserLogin,
        serde_json::json!({ "method": "otp" }),
    )
    .await;

    Ok(session)
}

pub async fn password_login(
    state: &AppState,
    payload: PasswordLoginRequest,
) -> AppResult<IssuedSession> {
    let invalid = || AppError::BadRequest("Invalid email or password".into());

    let user = find_user_by_email(&state.orm, &payload.email)
        .await?
        .ok_or_else(invalid)?;
    let stored = user.password_hash.as_deref().ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    let session = token_service::issue_session(&state.config.auth, user)?;

    audit::record(
        &state.orm,
        Some(session.user.id),
        AuditAction::UserLogin,
        serde_json::json!({ "method": "password" }),
    )
    .await;

    Ok(session)
}

/// Exchanges a refresh credential for a new pair; the presented one is blacklisted.
pub async fn refresh_session(state: &AppState, refresh_token: &str) -> AppResult<IssuedSession> {
    let auth = &state.config.auth;
    let claims = token_service::decode_token(auth, refresh_token, TokenKind::Refresh)?;

    if token_service::is_blacklisted(&state.orm, &claims.jti).await? {
        return Err(AppError::Unauthorized("Token is blacklisted".into()));
    }

    let user_id = token_service::claims_user_id(&claims)?;
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;

    if !token_service::blacklist(&state.orm, &claims).await? {
        return Err(AppError::Unauthorized("Token is blacklisted".into()));
    }

    tracing::debug!(user_id, "refresh credential rotated");
    token_service::issue_session(auth, user)
}

/// Blacklists the presented refresh credential, if any.
pub async fn logout(state: &AppState, refresh_token: Option<&str>) -> AppResult<()> {
    let Some(token) = refresh_token else {
        return Ok(());
    };

    let claims = token_service::decode_token(&state.config.auth, token, TokenKind::Refresh)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;
    token_service::blacklist(&state.orm, &claims).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits_in_range() {
        for _ in 0..1_000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("s3cret-pass").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"s3cret-pass", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
