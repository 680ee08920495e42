//! Access/refresh credential minting, verification, rotation bookkeeping and
//! the refresh cookie.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, TimeZone, Utc};
use cookie::{
    Cookie, SameSite,
    time::{Duration as CookieDuration, OffsetDateTime},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr, EntityTrait, SqlErr};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    dto::auth::{Claims, TokenKind},
    entity::{
        token_blacklist::{ActiveModel as BlacklistActive, Entity as TokenBlacklist},
        users::Model as UserModel,
    },
    error::{AppError, AppResult},
};

/// A freshly minted credential pair for one user.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access: String,
    pub refresh: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub user: UserModel,
}

pub fn issue_session(auth: &AuthConfig, user: UserModel) -> AppResult<IssuedSession> {
    let now = Utc::now();
    let (access, _) = encode_token(auth, &user, TokenKind::Access, now, auth.access_token_ttl)?;
    let (refresh, refresh_claims) =
        encode_token(auth, &user, TokenKind::Refresh, now, auth.refresh_token_ttl)?;

    Ok(IssuedSession {
        access,
        refresh,
        refresh_expires_at: timestamp_to_utc(refresh_claims.exp),
        user,
    })
}

fn encode_token(
    auth: &AuthConfig,
    user: &UserModel,
    kind: TokenKind,
    now: DateTime<Utc>,
    ttl: Duration,
) -> AppResult<(String, Claims)> {
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        token_type: kind,
        jti: Uuid::new_v4().simple().to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, claims))
}

/// Verifies signature, expiry and credential kind.
pub fn decode_token(auth: &AuthConfig, token: &str, expected: TokenKind) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    if decoded.claims.token_type != expected {
        return Err(AppError::Unauthorized("Wrong token type".into()));
    }
    Ok(decoded.claims)
}

pub fn claims_user_id(claims: &Claims) -> AppResult<i64> {
    claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))
}

fn timestamp_to_utc(ts: usize) -> DateTime<Utc> {
    Utc.timestamp_opt(ts as i64, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub async fn is_blacklisted<C: ConnectionTrait>(conn: &C, jti: &str) -> Result<bool, DbErr> {
    Ok(TokenBlacklist::find_by_id(jti.to_owned())
        .one(conn)
        .await?
        .is_some())
}

/// Records a refresh credential as spent. Returns `false` when it already was.
pub async fn blacklist<C: ConnectionTrait>(conn: &C, claims: &Claims) -> AppResult<bool> {
    let user_id = claims_user_id(claims)?;
    let entry = BlacklistActive {
        jti: Set(claims.jti.clone()),
        user_id: Set(user_id),
        expires_at: Set(timestamp_to_utc(claims.exp).into()),
        blacklisted_at: Set(Utc::now().into()),
    };

    match TokenBlacklist::insert(entry).exec_without_returning(conn).await {
        Ok(_) => Ok(true),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

/// `Set-Cookie` value carrying a refresh credential.
pub fn refresh_cookie(auth: &AuthConfig, token: &str, expires_at: DateTime<Utc>) -> String {
    let mut builder = Cookie::build((auth.refresh_cookie_name.clone(), token.to_owned()))
        .http_only(true)
        .secure(auth.refresh_cookie_secure)
        .same_site(SameSite::Lax)
        .path(auth.refresh_cookie_path.clone())
        .max_age(CookieDuration::seconds(auth.refresh_token_ttl.num_seconds()));
    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
        builder = builder.expires(expires);
    }
    builder.build().to_string()
}

/// `Set-Cookie` value that removes the refresh cookie.
pub fn clear_refresh_cookie(auth: &AuthConfig) -> String {
    Cookie::build((auth.refresh_cookie_name.clone(), String::new()))
        .http_only(true)
        .secure(auth.refresh_cookie_secure)
        .same_site(SameSite::Lax)
        .path(auth.refresh_cookie_path.clone())
        .max_age(CookieDuration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
        .to_string()
}

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user() -> UserModel {
        UserModel {
            id: 7,
            email: "buyer@example.com".into(),
            username: "buyer@example.com".into(),
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            password_hash: None,
            role: "user".into(),
            created_at: Utc::now().into(),
        }
    }

    fn auth() -> AuthConfig {
        AuthConfig::with_secret("test-secret")
    }

    #[test]
    fn issued_pair_decodes_with_matching_kinds() {
        let auth = auth();
        let session = issue_session(&auth, user()).unwrap();

        let access = decode_token(&auth, &session.access, TokenKind::Access).unwrap();
        assert_eq!(access.sub, "7");
        assert_eq!(access.role, "user");

        let refresh = decode_token(&auth, &session.refresh, TokenKind::Refresh).unwrap();
        assert_ne!(access.jti, refresh.jti);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn default_lifetimes_are_four_hours_and_ninety_days() {
        let auth = auth();
        let session = issue_session(&auth, user()).unwrap();
        let access = decode_token(&auth, &session.access, TokenKind::Access).unwrap();
        let refresh = decode_token(&auth, &session.refresh, TokenKind::Refresh).unwrap();
        assert_eq!(access.exp - access.iat, 4 * 60 * 60);
        assert_eq!(refresh.exp - refresh.iat, 90 * 24 * 60 * 60);
    }

    #[test]
    fn refresh_token_is_not_accepted_as_access() {
        let auth = auth();
        let session = issue_session(&auth, user()).unwrap();
        let err = decode_token(&auth, &session.refresh, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let session = issue_session(&AuthConfig::with_secret("other"), user()).unwrap();
        assert!(decode_token(&auth(), &session.access, TokenKind::Access).is_err());
    }

    #[test]
    fn refresh_cookie_is_http_only_secure_lax() {
        let auth = auth();
        let expires = Utc::now() + Duration::days(90);
        let cookie = refresh_cookie(&auth, "abc", expires);
        assert!(cookie.starts_with("refresh_token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Expires="));
    }

    #[test]
    fn clearing_cookie_expires_it() {
        let cookie = clear_refresh_cookie(&auth());
        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn reads_named_cookie_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=xyz; other=1"),
        );
        assert_eq!(read_cookie(&headers, "refresh_token").as_deref(), Some("xyz"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}
