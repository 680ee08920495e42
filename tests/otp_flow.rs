mod common;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use storefront_api::{
    dto::auth::{LoginOtpRequest, SignupRequest, TokenKind, VerifyOtpRequest},
    entity::{Otps, otps, users, Users},
    error::AppError,
    services::{auth_service, token_service},
};

fn signup_request(email: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        first_name: "Asha".into(),
        last_name: "Rao".into(),
    }
}

fn verify_request(email: &str, otp: &str) -> VerifyOtpRequest {
    VerifyOtpRequest {
        email: email.to_string(),
        otp: otp.to_string(),
    }
}

#[tokio::test]
async fn signup_code_verifies_exactly_once() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let email = common::unique_email("buyer");

    auth_service::request_signup_otp(&app.state, signup_request(&email)).await?;
    let code = app.mailer.last_code_for(&email).expect("otp delivered");
    assert_eq!(code.len(), 6);

    let session = auth_service::verify_otp(&app.state, verify_request(&email, &code)).await?;
    assert_eq!(session.user.email, email);
    let claims =
        token_service::decode_token(&app.state.config.auth, &session.access, TokenKind::Access)?;
    assert_eq!(claims.role, "user");

    let second = auth_service::verify_otp(&app.state, verify_request(&email, &code)).await;
    assert!(matches!(second, Err(AppError::InvalidOrExpiredOtp)));
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let email = common::unique_email("dup");

    auth_service::request_signup_otp(&app.state, signup_request(&email)).await?;
    let again = auth_service::request_signup_otp(&app.state, signup_request(&email)).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let users = Users::find()
        .filter(users::Column::Email.eq(email.clone()))
        .all(&app.state.orm)
        .await?;
    assert_eq!(users.len(), 1);
    assert_eq!(app.mailer.count_for(&email), 1);
    Ok(())
}

#[tokio::test]
async fn correct_code_with_unknown_email_is_not_found() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let email = common::unique_email("known");
    auth_service::request_signup_otp(&app.state, signup_request(&email)).await?;
    let code = app.mailer.last_code_for(&email).expect("otp delivered");

    let other = common::unique_email("unknown");
    let result = auth_service::verify_otp(&app.state, verify_request(&other, &code)).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}

/// Inserts an unverified `code` for `user_id`, issued `age` ago and living `ttl` from then.
async fn insert_code(
    app: &common::TestApp,
    user_id: i64,
    code: &str,
    age: Duration,
    ttl: Duration,
) -> anyhow::Result<otps::Model> {
    let issued = Utc::now() - age;
    let row = otps::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        code: Set(code.to_string()),
        created_at: Set(issued.into()),
        expires_at: Set((issued + ttl).into()),
        verified: Set(false),
    }
    .insert(&app.state.orm)
    .await?;
    Ok(row)
}

#[tokio::test]
async fn newest_matching_code_decides_when_it_has_expired() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let user = common::create_user(&app.state, "user").await?;
    let email = Users::find_by_id(user.user_id)
        .one(&app.state.orm)
        .await?
        .expect("user exists")
        .email;

    let older = insert_code(
        &app,
        user.user_id,
        "424242",
        Duration::minutes(2),
        Duration::minutes(10),
    )
    .await?;
    let newer = insert_code(
        &app,
        user.user_id,
        "424242",
        Duration::minutes(1),
        Duration::seconds(30),
    )
    .await?;
    assert!(older.is_valid_at(Utc::now()));
    assert!(!newer.is_valid_at(Utc::now()));

    let result = auth_service::verify_otp(&app.state, verify_request(&email, "424242")).await;
    assert!(matches!(result, Err(AppError::InvalidOrExpiredOtp)));

    let rows = Otps::find()
        .filter(otps::Column::UserId.eq(user.user_id))
        .all(&app.state.orm)
        .await?;
    assert!(rows.iter().all(|row| !row.verified));
    Ok(())
}

#[tokio::test]
async fn newest_matching_code_is_the_one_consumed() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let user = common::create_user(&app.state, "user").await?;
    let email = Users::find_by_id(user.user_id)
        .one(&app.state.orm)
        .await?
        .expect("user exists")
        .email;

    let older = insert_code(
        &app,
        user.user_id,
        "515151",
        Duration::minutes(20),
        Duration::minutes(10),
    )
    .await?;
    let newer = insert_code(
        &app,
        user.user_id,
        "515151",
        Duration::minutes(1),
        Duration::minutes(10),
    )
    .await?;

    let session = auth_service::verify_otp(&app.state, verify_request(&email, "515151")).await?;
    assert_eq!(session.user.id, user.user_id);

    let older = Otps::find_by_id(older.id)
        .one(&app.state.orm)
        .await?
        .expect("row kept");
    let newer = Otps::find_by_id(newer.id)
        .one(&app.state.orm)
        .await?
        .expect("row kept");
    assert!(newer.verified);
    assert!(!older.verified);
    Ok(())
}

#[tokio::test]
async fn malformed_email_is_a_bad_request() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let login = auth_service::request_login_otp(
        &app.state,
        LoginOtpRequest {
            email: "not-an-email".into(),
        },
    )
    .await;
    assert!(matches!(login, Err(AppError::BadRequest(_))));

    let verify =
        auth_service::verify_otp(&app.state, verify_request("not-an-email", "123456")).await;
    assert!(matches!(verify, Err(AppError::BadRequest(_))));

    let blank_email = common::unique_email("blank");
    let blank = auth_service::verify_otp(&app.state, verify_request(&blank_email, "")).await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn wrong_and_expired_codes_are_rejected_alike() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let email = common::unique_email("expiry");
    auth_service::request_signup_otp(&app.state, signup_request(&email)).await?;
    let code = app.mailer.last_code_for(&email).expect("otp delivered");

    let wrong = if code == "123456" { "654321" } else { "123456" };
    let result = auth_service::verify_otp(&app.state, verify_request(&email, wrong)).await;
    assert!(matches!(result, Err(AppError::InvalidOrExpiredOtp)));

    let user = auth_service::find_user_by_email(&app.state.orm, &email)
        .await?
        .expect("user exists");
    let past: sea_orm::prelude::DateTimeWithTimeZone = (Utc::now() - Duration::minutes(1)).into();
    Otps::update_many()
        .col_expr(otps::Column::ExpiresAt, Expr::value(past))
        .filter(otps::Column::UserId.eq(user.id))
        .exec(&app.state.orm)
        .await?;

    let result = auth_service::verify_otp(&app.state, verify_request(&email, &code)).await;
    assert!(matches!(result, Err(AppError::InvalidOrExpiredOtp)));
    Ok(())
}

#[tokio::test]
async fn login_issues_fresh_code_and_retires_consumed_ones() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let email = common::unique_email("login");
    auth_service::request_signup_otp(&app.state, signup_request(&email)).await?;
    let first = app.mailer.last_code_for(&email).expect("otp delivered");
    auth_service::verify_otp(&app.state, verify_request(&email, &first)).await?;

    auth_service::request_login_otp(
        &app.state,
        LoginOtpRequest {
            email: email.clone(),
        },
    )
    .await?;
    let second = app.mailer.last_code_for(&email).expect("otp delivered");
    assert_eq!(app.mailer.count_for(&email), 2);

    if second != first {
        let replay = auth_service::verify_otp(&app.state, verify_request(&email, &first)).await;
        assert!(matches!(replay, Err(AppError::InvalidOrExpiredOtp)));
    }

    let session = auth_service::verify_otp(&app.state, verify_request(&email, &second)).await?;
    assert_eq!(session.user.email, email);
    Ok(())
}

#[tokio::test]
async fn login_for_unknown_email_is_not_found() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let result = auth_service::request_login_otp(
        &app.state,
        LoginOtpRequest {
            email: common::unique_email("ghost"),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_logout_revokes() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let email = common::unique_email("refresh");
    auth_service::request_signup_otp(&app.state, signup_request(&email)).await?;
    let code = app.mailer.last_code_for(&email).expect("otp delivered");
    let session = auth_service::verify_otp(&app.state, verify_request(&email, &code)).await?;

    let rotated = auth_service::refresh_session(&app.state, &session.refresh).await?;
    assert_ne!(rotated.refresh, session.refresh);

    let replay = auth_service::refresh_session(&app.state, &session.refresh).await;
    assert!(matches!(replay, Err(AppError::Unauthorized(_))));

    auth_service::logout(&app.state, Some(&rotated.refresh)).await?;
    let after_logout = auth_service::refresh_session(&app.state, &rotated.refresh).await;
    assert!(matches!(after_logout, Err(AppError::Unauthorized(_))));

    // A second logout with the same credential is harmless.
    auth_service::logout(&app.state, Some(&rotated.refresh)).await?;
    auth_service::logout(&app.state, None).await?;
    Ok(())
}

#[tokio::test]
async fn access_credential_cannot_refresh() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let email = common::unique_email("kind");
    auth_service::request_signup_otp(&app.state, signup_request(&email)).await?;
    let code = app.mailer.last_code_for(&email).expect("otp delivered");
    let session = auth_service::verify_otp(&app.state, verify_request(&email, &code)).await?;

    let result = auth_service::refresh_session(&app.state, &session.access).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    Ok(())
}
