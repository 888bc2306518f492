//! Common API utilities and shared types
//!
//! Query parsing helpers, the client address extractor and the mapping from
//! service errors to `ApiError`.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::api::middleware::ApiError;
use crate::models::ListParams;
use crate::services::{
    BlogServiceError, CampServiceError, LeadServiceError, SiteServiceError,
    TrainingServiceError, UserServiceError,
};

// ============================================================================
// Query helpers
// ============================================================================

/// First of two parameter spellings that carries a non-blank value
pub fn first_present<'a>(main: Option<&'a str>, alias: Option<&'a str>) -> Option<&'a str> {
    let present = |raw: Option<&'a str>| raw.map(str::trim).filter(|s| !s.is_empty());
    present(main).or_else(|| present(alias))
}

/// Interpret a boolean query flag.
///
/// `1/true/yes` and `0/false/no` (any case) are understood; anything else,
/// including an empty value, means the flag was not given.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Strict switch: only `true` in any case turns it on
pub fn is_true(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// Parse an optional choice parameter; unknown values are a 400
pub fn parse_choice<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Invalid value for {}", field),
                serde_json::json!({ field: [format!("Выберите корректный вариант. {} нет среди допустимых значений.", value)] }),
            )
        }),
    }
}

/// Parse an optional numeric id parameter; garbage is a 400
pub fn parse_id(field: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Invalid value for {}", field),
                serde_json::json!({ field: ["Введите число."] }),
            )
        }),
    }
}

/// Admin pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

// ============================================================================
// Client address
// ============================================================================

/// Request extension telling `ClientIp` whether proxy headers are honoured
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustProxyHeaders(pub bool);

/// Best-effort client address.
///
/// With `TrustProxyHeaders(true)` in the request extensions: `X-Forwarded-For`,
/// then `X-Real-IP`. Otherwise, or when neither is set, the socket peer, else
/// `"unknown"`.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl ClientIp {
    fn from_proxy_headers(parts: &Parts) -> Option<String> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }

        parts
            .headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TrustProxyHeaders(trusted) = parts
            .extensions
            .get::<TrustProxyHeaders>()
            .copied()
            .unwrap_or_default();
        if trusted {
            if let Some(ip) = Self::from_proxy_headers(parts) {
                return Ok(ClientIp(ip));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientIp(peer.unwrap_or_else(|| "unknown".to_string())))
    }
}

// ============================================================================
// Service error mapping
// ============================================================================

impl From<BlogServiceError> for ApiError {
    fn from(e: BlogServiceError) -> Self {
        match e {
            BlogServiceError::NotFound(msg) => ApiError::not_found(msg),
            BlogServiceError::ValidationError(errors) => ApiError::field_errors(errors),
            BlogServiceError::Conflict(msg) => ApiError::conflict(msg),
            BlogServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<CampServiceError> for ApiError {
    fn from(e: CampServiceError) -> Self {
        match e {
            CampServiceError::NotFound(msg) => ApiError::not_found(msg),
            CampServiceError::ValidationError(errors) => ApiError::field_errors(errors),
            CampServiceError::Conflict(msg) => ApiError::conflict(msg),
            CampServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<TrainingServiceError> for ApiError {
    fn from(e: TrainingServiceError) -> Self {
        match e {
            TrainingServiceError::NotFound(msg) => ApiError::not_found(msg),
            TrainingServiceError::ValidationError(errors) => ApiError::field_errors(errors),
            TrainingServiceError::Conflict(msg) => ApiError::conflict(msg),
            TrainingServiceError::InternalError(e) => {
                ApiError::internal_error(format!("{:#}", e))
            }
        }
    }
}

impl From<SiteServiceError> for ApiError {
    fn from(e: SiteServiceError) -> Self {
        match e {
            SiteServiceError::ValidationError(errors) => ApiError::field_errors(errors),
            SiteServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<LeadServiceError> for ApiError {
    fn from(e: LeadServiceError) -> Self {
        match e {
            LeadServiceError::NotFound(msg) => ApiError::not_found(msg),
            LeadServiceError::ValidationError(errors) => ApiError::field_errors(errors),
            LeadServiceError::RateLimited => ApiError::rate_limited(
                "Слишком много заявок. Попробуйте позже.",
                600,
            ),
            LeadServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(errors) => ApiError::field_errors(errors),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::NotFound(msg) => ApiError::not_found(msg),
            UserServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            UserServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}
