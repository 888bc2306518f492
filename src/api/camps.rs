//! Camp API endpoints
//!
//! - GET /api/camps - Camp list
//! - GET /api/camps/featured - Up to three featured camps
//! - GET /api/camps/{slug} - Camp detail

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::api::common::{is_true, parse_choice, parse_flag};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{CampDetail, CampListItem};
use crate::models::CampFilter;

#[derive(Debug, Default, Deserialize)]
pub struct CampListQuery {
    pub status: Option<String>,
    pub is_featured: Option<String>,
    pub upcoming: Option<String>,
    pub past: Option<String>,
}

impl CampListQuery {
    pub fn filter(&self, today: NaiveDate) -> Result<CampFilter, ApiError> {
        let mut filter = CampFilter::new(today);
        filter.status = parse_choice("status", self.status.as_deref())?;
        filter.featured = parse_flag(self.is_featured.as_deref());
        filter.upcoming = is_true(self.upcoming.as_deref());
        filter.past = is_true(self.past.as_deref());
        Ok(filter)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_camps))
        .route("/featured", get(featured_camps))
        .route("/{slug}", get(get_camp))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// GET /api/camps
async fn list_camps(
    State(state): State<AppState>,
    Query(query): Query<CampListQuery>,
) -> Result<Json<Vec<CampListItem>>, ApiError> {
    let filter = query.filter(today())?;
    let camps = state.camp_service.list(&filter).await?;
    Ok(Json(
        camps
            .iter()
            .map(|camp| CampListItem::new(camp, &state.media))
            .collect(),
    ))
}

/// GET /api/camps/featured
async fn featured_camps(
    State(state): State<AppState>,
    Query(query): Query<CampListQuery>,
) -> Result<Json<Vec<CampListItem>>, ApiError> {
    let filter = query.filter(today())?;
    let camps = state.camp_service.featured(&filter).await?;
    Ok(Json(
        camps
            .iter()
            .map(|camp| CampListItem::new(camp, &state.media))
            .collect(),
    ))
}

/// GET /api/camps/{slug}
async fn get_camp(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CampDetail>, ApiError> {
    let camp = state.camp_service.get_public(&slug).await?;
    Ok(Json(CampDetail::new(camp, &state.media)))
}
