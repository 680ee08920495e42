use std::{env, str::FromStr, time::Duration};

use anyhow::Context;

/// SMTP relay settings. Absent when `SMTP_HOST` is not configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl: chrono::Duration,
    pub refresh_token_ttl: chrono::Duration,
    pub refresh_cookie_name: String,
    pub refresh_cookie_secure: bool,
    pub refresh_cookie_path: String,
    pub otp_ttl: chrono::Duration,
}

impl AuthConfig {
    /// Defaults for everything except the signing secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl: chrono::Duration::hours(4),
            refresh_token_ttl: chrono::Duration::days(90),
            refresh_cookie_name: "refresh_token".to_string(),
            refresh_cookie_secure: true,
            refresh_cookie_path: "/".to_string(),
            otp_ttl: chrono::Duration::minutes(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
    pub smtp: Option<SmtpConfig>,
    pub stripe: Option<StripeConfig>,
    pub payment_currency: String,
    pub external_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000u16);

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let mut auth = AuthConfig::with_secret(jwt_secret);
        auth.access_token_ttl = chrono::Duration::minutes(parse_or("ACCESS_TOKEN_TTL_MINUTES", 240));
        auth.refresh_token_ttl = chrono::Duration::days(parse_or("REFRESH_TOKEN_TTL_DAYS", 90));
        auth.otp_ttl = chrono::Duration::minutes(parse_or("OTP_TTL_MINUTES", 5));
        auth.refresh_cookie_secure = parse_or("REFRESH_COOKIE_SECURE", true);
        if let Ok(name) = env::var("REFRESH_COOKIE_NAME") {
            auth.refresh_cookie_name = name;
        }
        if let Ok(path) = env::var("REFRESH_COOKIE_PATH") {
            auth.refresh_cookie_path = path;
        }

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: parse_or("SMTP_PORT", 587u16),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from: env::var("MAIL_FROM").context("MAIL_FROM is required with SMTP_HOST")?,
            }),
            Err(_) => None,
        };

        let stripe = env::var("STRIPE_SECRET_KEY").ok().map(|secret_key| StripeConfig {
            secret_key,
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        });

        Ok(Self {
            database_url,
            host,
            port,
            auth,
            cors_allowed_origins,
            smtp,
            stripe,
            payment_currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "inr".to_string()),
            external_timeout: Duration::from_secs(parse_or("EXTERNAL_TIMEOUT_SECS", 10)),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}
