//! Core API endpoints
//!
//! - GET /api/core/contact - Contact block
//! - GET /api/core/club - Club profile
//! - POST /api/core/lead - Visitor contact request

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::common::ClientIp;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ClubResponse, ContactResponse};
use crate::models::LeadInput;

pub const LEAD_THANKS: &str = "Спасибо! Мы свяжемся с вами в ближайшее время.";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", get(get_contact))
        .route("/club", get(get_club))
        .route("/lead", post(create_lead))
}

/// GET /api/core/contact
///
/// 204 when nothing is configured yet.
async fn get_contact(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(match state.site_service.contact().await? {
        Some(contact) => Json(ContactResponse::from(contact)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// GET /api/core/club
async fn get_club(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(match state.site_service.club().await? {
        Some(club) => Json(ClubResponse::new(club, &state.media)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// POST /api/core/lead
async fn create_lead(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    Json(body): Json<LeadInput>,
) -> Result<impl IntoResponse, ApiError> {
    state.lead_service.submit(&client, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: LEAD_THANKS,
        }),
    ))
}
