use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::post,
};

use crate::{
    config::AuthConfig,
    dto::auth::{
        AccessTokenResponse, LoginOtpRequest, LoginResponse, OtpDispatched, PasswordLoginRequest,
        RefreshRequest, SessionUser, SignupRequest, VerifyOtpRequest,
    },
    error::{AppError, AppResult},
    middleware::json::AppJson,
    response::{ApiResponse, Meta},
    services::{
        auth_service,
        token_service::{self, IssuedSession},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", post(signup))
        .route("/auth/login/", post(login))
        .route("/auth/verify-otp/", post(verify_otp))
        .route("/auth/token/", post(password_login))
        .route("/auth/token/refresh/", post(refresh))
        .route("/auth/logout/", post(logout))
}

fn session_cookie(auth: &AuthConfig, session: &IssuedSession) -> [(header::HeaderName, String); 1] {
    [(
        header::SET_COOKIE,
        token_service::refresh_cookie(auth, &session.refresh, session.refresh_expires_at),
    )]
}

fn login_body(session: IssuedSession) -> LoginResponse {
    let name = format!("{} {}", session.user.first_name, session.user.last_name)
        .trim()
        .to_string();
    LoginResponse {
        access: session.access,
        user: SessionUser {
            name,
            email: session.user.email,
        },
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signup/",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created, OTP sent", body = ApiResponse<OtpDispatched>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists"),
        (status = 502, description = "OTP could not be delivered")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> AppResult<Json<ApiResponse<OtpDispatched>>> {
    let resp = auth_service::request_signup_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login/",
    request_body = LoginOtpRequest,
    responses(
        (status = 200, description = "OTP sent", body = ApiResponse<OtpDispatched>),
        (status = 404, description = "User not found")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginOtpRequest>,
) -> AppResult<Json<ApiResponse<OtpDispatched>>> {
    let resp = auth_service::request_login_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-otp/",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Logged in; refresh credential set as cookie", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid or expired OTP"),
        (status = 404, description = "User not found")
    ),
    tag = "Auth"
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyOtpRequest>,
) -> AppResult<impl IntoResponse> {
    let session = auth_service::verify_otp(&state, payload).await?;
    let cookie = session_cookie(&state.config.auth, &session);
    let body = ApiResponse::success("Login successful", login_body(session), Some(Meta::empty()));
    Ok((cookie, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/auth/token/",
    request_body = PasswordLoginRequest,
    responses(
        (status = 200, description = "Logged in; refresh credential set as cookie", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid email or password")
    ),
    tag = "Auth"
)]
pub async fn password_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PasswordLoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = auth_service::password_login(&state, payload).await?;
    let cookie = session_cookie(&state.config.auth, &session);
    let body = ApiResponse::success("Login successful", login_body(session), Some(Meta::empty()));
    Ok((cookie, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/auth/token/refresh/",
    request_body(content = Option<RefreshRequest>, description = "Only read when the refresh cookie is absent"),
    responses(
        (status = 200, description = "New access credential; refresh credential rotated", body = ApiResponse<AccessTokenResponse>),
        (status = 401, description = "Missing, invalid, expired or blacklisted refresh credential")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> AppResult<impl IntoResponse> {
    let auth = &state.config.auth;
    let presented = token_service::read_cookie(&headers, &auth.refresh_cookie_name)
        .or_else(|| payload.and_then(|Json(body)| body.refresh))
        .ok_or_else(|| AppError::Unauthorized("Refresh credential missing".into()))?;

    let session = auth_service::refresh_session(&state, &presented).await?;
    let cookie = session_cookie(auth, &session);
    let body = ApiResponse::success(
        "Token refreshed",
        AccessTokenResponse {
            access: session.access,
        },
        Some(Meta::empty()),
    );
    Ok((cookie, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout/",
    responses(
        (status = 200, description = "Logged out; refresh cookie cleared"),
        (status = 400, description = "Refresh credential could not be invalidated; cookie still cleared")
    ),
    tag = "Auth"
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = &state.config.auth;
    let presented = token_service::read_cookie(&headers, &auth.refresh_cookie_name);
    let cleared = [(header::SET_COOKIE, token_service::clear_refresh_cookie(auth))];

    match auth_service::logout(&state, presented.as_deref()).await {
        Ok(()) => (
            cleared,
            Json(ApiResponse::success(
                "Logged out",
                serde_json::json!({}),
                Some(Meta::empty()),
            )),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "logout could not blacklist refresh credential");
            (cleared, err).into_response()
        }
    }
}
