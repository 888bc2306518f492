//! Admin API endpoints
//!
//! Everything under `/api/admin` requires an editor session; user management
//! additionally requires an admin. Admin endpoints return models as stored,
//! media fields are relative paths under the media root.
//!
//! - GET /api/admin/dashboard - Content counts and server statistics
//! - CRUD for blog, camps, trainings (see submodules)
//! - PUT /api/admin/contact, PUT /api/admin/club - Site singletons
//! - /api/admin/leads - Lead inbox
//! - /api/admin/users - Staff accounts (admin only)
//! - POST /api/admin/upload - Media upload

mod content;
mod site;
mod trainings;
mod upload;
mod users;

use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;
use std::process;
use sysinfo::{Pid, System};

use crate::api::middleware::{require_admin, ApiError, AppState};

pub use upload::UploadResponse;

/// App version reported on the dashboard
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Content counts for the dashboard
#[derive(Debug, Serialize)]
pub struct ContentCounts {
    pub articles: i64,
    pub camps: i64,
    pub coaches: i64,
    pub sessions: i64,
    pub leads: i64,
}

/// Process and host figures
#[derive(Debug, Serialize)]
pub struct SystemStats {
    pub version: &'static str,
    /// Process memory usage in bytes
    pub memory_bytes: u64,
    pub memory_formatted: String,
    pub system_total_memory: u64,
    pub system_used_memory: u64,
    pub os_name: String,
}

/// Request statistics since start
#[derive(Debug, Serialize)]
pub struct RequestSummary {
    pub uptime_seconds: u64,
    pub uptime_formatted: String,
    pub total_requests: u64,
    /// Average response time in milliseconds
    pub avg_response_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub counts: ContentCounts,
    pub requests: RequestSummary,
    pub system: SystemStats,
}

/// Build the admin router; callers add the auth and editor layers.
/// `max_upload` is the media file size limit in bytes.
pub fn router(max_upload: u64) -> Router<AppState> {
    let admin_only = users::router().route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/dashboard", get(get_dashboard))
        .merge(content::router())
        .merge(trainings::router())
        .merge(site::router())
        .merge(upload::router(max_upload))
        .nest("/users", admin_only)
}

/// GET /api/admin/dashboard
async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let counts = ContentCounts {
        articles: state.blog_service.count_articles().await?,
        camps: state.camp_service.count().await?,
        coaches: state.training_service.count_coaches().await?,
        sessions: state.training_service.count_sessions().await?,
        leads: state.lead_service.count().await?,
    };

    let stats = &state.request_stats;
    let uptime_seconds = stats.uptime_seconds();
    let requests = RequestSummary {
        uptime_seconds,
        uptime_formatted: format_uptime(uptime_seconds),
        total_requests: stats.total_requests(),
        avg_response_time_ms: stats.avg_response_time_us() / 1000.0,
    };

    // sysinfo refresh is blocking
    let system = tokio::task::spawn_blocking(system_stats)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read system stats: {}", e)))?;

    Ok(Json(DashboardResponse {
        counts,
        requests,
        system,
    }))
}

fn system_stats() -> SystemStats {
    let mut sys = System::new_all();
    sys.refresh_all();

    let memory_bytes = sys
        .process(Pid::from_u32(process::id()))
        .map(|proc| proc.memory())
        .unwrap_or(0);

    SystemStats {
        version: APP_VERSION,
        memory_bytes,
        memory_formatted: format_bytes(memory_bytes),
        system_total_memory: sys.total_memory(),
        system_used_memory: sys.used_memory(),
        os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
    }
}

/// Format uptime to human readable string
fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Format bytes to human readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
