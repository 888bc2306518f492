//! Site singletons and the lead inbox

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{ClubInput, ClubProfile, ContactInfo, ContactInput, LeadRequest, PagedResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", put(save_contact))
        .route("/club", put(save_club))
        .route("/leads", get(list_leads))
        .route("/leads/{id}", get(get_lead).delete(delete_lead))
}

/// PUT /api/admin/contact
///
/// Creates the contact block on first save, replaces social links wholesale.
async fn save_contact(
    State(state): State<AppState>,
    Json(body): Json<ContactInput>,
) -> Result<Json<ContactInfo>, ApiError> {
    Ok(Json(state.site_service.save_contact(&body).await?))
}

/// PUT /api/admin/club
async fn save_club(
    State(state): State<AppState>,
    Json(body): Json<ClubInput>,
) -> Result<Json<ClubProfile>, ApiError> {
    Ok(Json(state.site_service.save_club(&body).await?))
}

/// GET /api/admin/leads
async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PagedResult<LeadRequest>>, ApiError> {
    Ok(Json(state.lead_service.list(&query.params()).await?))
}

async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LeadRequest>, ApiError> {
    Ok(Json(state.lead_service.get(id).await?))
}

async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.lead_service.delete(id).await?;
    tracing::info!(lead_id = id, "Lead deleted");
    Ok(StatusCode::NO_CONTENT)
}
