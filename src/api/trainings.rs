//! Training API endpoints
//!
//! Schedule, coaches and price lists:
//! - GET /api/trainings/schedule[/{id}] - Sessions in the date window
//! - GET /api/trainings/schedule/filters, /api/trainings/meta - Filter widget data
//! - GET /api/trainings/schedule-simple - Compact sessions for calendars
//! - GET /api/trainings/coaches[/{id}]
//! - GET /api/trainings/plans[/{id}]
//! - GET /api/trainings/session-tariffs[/{id}]

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::api::common::{parse_choice, parse_flag, parse_id};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{
    CoachResponse, LevelResponse, MetaResponse, PlanResponse, SessionResponse,
    SimpleSessionResponse, TariffResponse,
};
use crate::models::{CoachFilter, DateWindow, PriceListFilter, SessionFilter};

/// Query parameters for the schedule
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    #[serde(rename = "type")]
    pub session_type: Option<String>,
    #[serde(rename = "direction__id")]
    pub direction_id: Option<String>,
    #[serde(rename = "coach__id")]
    pub coach_id: Option<String>,
    #[serde(rename = "location__id")]
    pub location_id: Option<String>,
    #[serde(rename = "levels__tag")]
    pub level: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ScheduleQuery {
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        DateWindow::from_params(self.start.as_deref(), self.end.as_deref(), today)
    }

    pub fn filter(&self, today: NaiveDate) -> Result<SessionFilter, ApiError> {
        Ok(SessionFilter {
            session_type: parse_choice("type", self.session_type.as_deref())?,
            direction_id: parse_id("direction__id", self.direction_id.as_deref())?,
            coach_id: parse_id("coach__id", self.coach_id.as_deref())?,
            location_id: parse_id("location__id", self.location_id.as_deref())?,
            level: parse_choice("levels__tag", self.level.as_deref())?,
            window: self.window(today),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CoachQuery {
    pub is_featured: Option<String>,
    #[serde(rename = "directions__id")]
    pub direction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceListQuery {
    pub category: Option<String>,
    pub is_featured: Option<String>,
}

impl PriceListQuery {
    pub fn filter(&self) -> Result<PriceListFilter, ApiError> {
        Ok(PriceListFilter {
            category: parse_choice("category", self.category.as_deref())?,
            featured: parse_flag(self.is_featured.as_deref()),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schedule", get(list_schedule))
        .route("/schedule/filters", get(meta))
        .route("/schedule/{id}", get(get_session))
        .route("/schedule-simple", get(simple_schedule))
        .route("/meta", get(meta))
        .route("/coaches", get(list_coaches))
        .route("/coaches/{id}", get(get_coach))
        .route("/plans", get(list_plans))
        .route("/plans/{id}", get(get_plan))
        .route("/session-tariffs", get(list_tariffs))
        .route("/session-tariffs/{id}", get(get_tariff))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// GET /api/trainings/schedule
async fn list_schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let filter = query.filter(today())?;
    let sessions = state.training_service.list_sessions(&filter).await?;
    Ok(Json(
        sessions
            .into_iter()
            .map(|session| SessionResponse::new(session, &state.media))
            .collect(),
    ))
}

/// GET /api/trainings/schedule/{id}
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<SessionResponse>, ApiError> {
    let filter = query.filter(today())?;
    let session = state.training_service.get_session(id, Some(&filter)).await?;
    Ok(Json(SessionResponse::new(session, &state.media)))
}

/// GET /api/trainings/schedule-simple
///
/// Only the date window applies here.
async fn simple_schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<SimpleSessionResponse>>, ApiError> {
    let filter = SessionFilter {
        window: query.window(today()),
        ..Default::default()
    };
    let sessions = state.training_service.list_sessions(&filter).await?;
    Ok(Json(sessions.into_iter().map(SimpleSessionResponse::from).collect()))
}

/// GET /api/trainings/meta
async fn meta(State(state): State<AppState>) -> Result<Json<MetaResponse>, ApiError> {
    let meta = state.training_service.meta().await?;
    Ok(Json(MetaResponse {
        directions: meta.directions,
        coaches: meta
            .coaches
            .into_iter()
            .map(|coach| CoachResponse::new(coach, &state.media))
            .collect(),
        locations: meta.locations,
        levels: meta.levels.iter().map(LevelResponse::from).collect(),
    }))
}

/// GET /api/trainings/coaches
async fn list_coaches(
    State(state): State<AppState>,
    Query(query): Query<CoachQuery>,
) -> Result<Json<Vec<CoachResponse>>, ApiError> {
    let filter = CoachFilter {
        featured: parse_flag(query.is_featured.as_deref()),
        direction_id: parse_id("directions__id", query.direction_id.as_deref())?,
    };
    let coaches = state.training_service.list_coaches(&filter).await?;
    Ok(Json(
        coaches
            .into_iter()
            .map(|coach| CoachResponse::new(coach, &state.media))
            .collect(),
    ))
}

/// GET /api/trainings/coaches/{id}
async fn get_coach(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CoachResponse>, ApiError> {
    let coach = state.training_service.get_coach(id).await?;
    Ok(Json(CoachResponse::new(coach, &state.media)))
}

/// GET /api/trainings/plans
async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PriceListQuery>,
) -> Result<Json<Vec<PlanResponse>>, ApiError> {
    let plans = state.training_service.list_plans(&query.filter()?).await?;
    Ok(Json(plans.into_iter().map(PlanResponse::from).collect()))
}

/// GET /api/trainings/plans/{id}
async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PlanResponse>, ApiError> {
    Ok(Json(state.training_service.get_plan(id).await?.into()))
}

/// GET /api/trainings/session-tariffs
async fn list_tariffs(
    State(state): State<AppState>,
    Query(query): Query<PriceListQuery>,
) -> Result<Json<Vec<TariffResponse>>, ApiError> {
    let tariffs = state.training_service.list_tariffs(&query.filter()?).await?;
    Ok(Json(tariffs.into_iter().map(TariffResponse::from).collect()))
}

/// GET /api/trainings/session-tariffs/{id}
async fn get_tariff(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TariffResponse>, ApiError> {
    Ok(Json(state.training_service.get_tariff(id).await?.into()))
}
