//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints of the Gabi backend:
//! - Blog, camp and training endpoints for the public site
//! - Core endpoints (contact block, club profile, lead form)
//! - Staff authentication
//! - Admin endpoints
//! - Media serving and health check

pub mod admin;
pub mod auth;
pub mod blog;
pub mod camps;
pub mod common;
pub mod core;
pub mod middleware;
pub mod responses;
pub mod trainings;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware as axum_middleware,
    routing::get,
    Extension, Json, Router, ServiceExt,
};
use std::net::SocketAddr;
use serde::Serialize;
use tower::Layer;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::api::common::TrustProxyHeaders;
use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState, RequestStats};

/// Cache policy for uploaded media; editors replace files in place
const MEDIA_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// Build the API router, mounted under `/api`
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need an editor; users need an admin, see admin::router)
    let admin_routes = admin::router(state.media.max_file_size)
        .route_layer(axum_middleware::from_fn(middleware::require_editor))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected auth routes (need any session)
    let protected_auth = auth::protected_router().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth),
    );

    // Public routes
    Router::new()
        .route("/health", get(health))
        .nest("/blog", blog::router())
        .nest("/camps", camps::router())
        .nest("/trainings", trainings::router())
        .nest("/core", core::router())
        .nest("/auth", auth::public_router().merge(protected_auth))
        .nest("/admin", admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let media_path = media_mount_path(&state.media.url_prefix);
    let media_service = SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static(MEDIA_CACHE_CONTROL),
    )
    .layer(ServeDir::new(&state.media.root));

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service(&media_path, media_service)
        .layer(Extension(TrustProxyHeaders(server.trust_proxy_headers)))
        .layer(cors_layer(&server.cors_origin))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

/// The served application: `build_router` with trailing slashes trimmed
/// before routing, so `/api/camps/` and `/api/camps` are the same route.
pub fn build_app(state: AppState, server: &ServerConfig) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state, server))
}

/// Serve `app` on `listener`, recording each connection's peer address for
/// `ClientIp`
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: NormalizePath<Router>,
) -> std::io::Result<()> {
    let service = ServiceExt::<axum::extract::Request>::into_make_service_with_connect_info::<
        SocketAddr,
    >(app);
    axum::serve(listener, service).await
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.pool.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!("Health check database ping failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "error",
                    database: "unavailable",
                }),
            )
        }
    }
}

/// CORS for the site frontend, with cookies
fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let origin = origin.trim();
    if origin == "*" {
        // credentials forbid a literal wildcard
        return cors.allow_origin(AllowOrigin::mirror_request());
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => cors.allow_origin(value),
        Err(e) => {
            tracing::warn!(origin, "Invalid CORS origin, cross-origin requests disabled: {}", e);
            cors
        }
    }
}

/// Mount path for the media root, `/media` unless configured otherwise
fn media_mount_path(url_prefix: &str) -> String {
    let trimmed = url_prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/media".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_mount_path() {
        assert_eq!(media_mount_path("/media/"), "/media");
        assert_eq!(media_mount_path("uploads"), "/uploads");
        assert_eq!(media_mount_path("/"), "/media");
        assert_eq!(media_mount_path(""), "/media");
    }
}
