//! Authentication API endpoints
//!
//! Handles HTTP requests for staff authentication:
//! - POST /api/auth/login - Log in, sets the session cookie
//! - POST /api/auth/logout - Log out
//! - GET /api/auth/me - Current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::IpAddr;

use crate::api::common::ClientIp;
use crate::api::middleware::{extract_session_token, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::services::{LoginInput, UserServiceError};

/// Session cookie lifetime, matches the session expiry
const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

fn session_cookie(token: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, max_age
    );
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    Json(body): Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    // IP throttling only applies when the client address is known
    if let Ok(ip) = client.parse::<IpAddr>() {
        if state.rate_limiter.is_ip_limited(ip).await {
            tracing::warn!(%ip, "Login rate limited by IP");
            return Err(ApiError::rate_limited(
                "Too many login requests, try again later",
                60,
            ));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    let username = body.username_or_email.trim().to_string();
    if state.rate_limiter.is_username_limited(&username).await {
        tracing::warn!(username = %username, "Login rate limited by username");
        return Err(ApiError::rate_limited(
            "Too many failed login attempts, try again in 15 minutes",
            900,
        ));
    }

    let (user, session) = match state.user_service.login(&body).await {
        Ok(result) => result,
        Err(e) => {
            if matches!(e, UserServiceError::AuthenticationError(_)) {
                state.rate_limiter.record_failed_attempt(&username).await;
                tracing::info!(username = %username, "Failed login attempt");
            }
            return Err(e.into());
        }
    };

    state.rate_limiter.clear_username_attempts(&username).await;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&session.id, SESSION_MAX_AGE_SECS)?,
    );

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/auth/logout
///
/// Requires authentication.
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.logout(&token).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/auth/me
///
/// Requires authentication.
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_format() {
        let value = session_cookie("abc", SESSION_MAX_AGE_SECS).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800"
        );
    }

    #[test]
    fn test_session_cookie_rejects_control_chars() {
        assert!(session_cookie("bad\ntoken", 0).is_err());
    }
}
