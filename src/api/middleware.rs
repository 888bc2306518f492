//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type every handler returns
//! - Authentication (session cookie or bearer token) and role checks
//! - Request statistics for the admin dashboard

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::MediaConfig;
use crate::db::repositories::{
    SqlxArticleRepository, SqlxCampRepository, SqlxCatalogRepository, SqlxCoachRepository,
    SqlxLeadRepository, SqlxPricingRepository, SqlxScheduleRepository, SqlxSessionRepository,
    SqlxSiteRepository, SqlxTagRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    BlogService, CampService, FieldErrors, LeadService, LoginRateLimiter, Notifier, SiteService,
    TrainingService, UserService,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Sum of response times in microseconds
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub blog_service: Arc<BlogService>,
    pub camp_service: Arc<CampService>,
    pub training_service: Arc<TrainingService>,
    pub site_service: Arc<SiteService>,
    pub lead_service: Arc<LeadService>,
    pub media: Arc<MediaConfig>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire repositories and services over one database pool.
    ///
    /// Without a notifier leads are stored but not relayed.
    pub fn new(
        pool: DynDatabasePool,
        media: MediaConfig,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let coach_repo = SqlxCoachRepository::boxed(pool.clone());

        let user_service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
        );
        let blog_service = BlogService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
        );
        let camp_service =
            CampService::new(SqlxCampRepository::boxed(pool.clone()), coach_repo.clone());
        let training_service = TrainingService::new(
            SqlxCatalogRepository::boxed(pool.clone()),
            coach_repo,
            SqlxPricingRepository::boxed(pool.clone()),
            SqlxScheduleRepository::boxed(pool.clone()),
        );
        let site_service = SiteService::new(SqlxSiteRepository::boxed(pool.clone()));
        let lead_service = LeadService::new(SqlxLeadRepository::boxed(pool.clone()), notifier);

        Self {
            pool,
            user_service: Arc::new(user_service),
            blog_service: Arc::new(blog_service),
            camp_service: Arc::new(camp_service),
            training_service: Arc::new(training_service),
            site_service: Arc::new(site_service),
            lead_service: Arc::new(lead_service),
            media: Arc::new(media),
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            request_stats: Arc::new(RequestStats::new()),
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Validation error carrying `{field: [messages]}`
    pub fn field_errors(errors: FieldErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_default();
        Self::with_details("VALIDATION_ERROR", "Validation failed", details)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new("PAYLOAD_TOO_LARGE", message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: u64) -> Self {
        Self::with_details(
            "RATE_LIMITED",
            message,
            serde_json::json!({ "retry_after": retry_after }),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "PAYLOAD_TOO_LARGE" => StatusCode::PAYLOAD_TOO_LARGE,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.error.code, "{}", self.error.message);
        }
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Session token from `Authorization: Bearer` or the `session` cookie
pub fn extract_session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session validation failed: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Editor authorization middleware; admins pass too
pub async fn require_editor(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_editor() {
        return Err(ApiError::forbidden("Editor privileges required"));
    }

    Ok(next.run(request).await)
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Request statistics middleware
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;

    let duration_us = start.elapsed().as_micros() as u64;
    state.request_stats.record(duration_us);

    response
}
