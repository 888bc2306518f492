//! Training catalogue management
//!
//! Directions, locations, coaches, price lists and the schedule. Sessions are
//! listed without the public date window, past sessions included.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{
    Coach, CoachFilter, CoachInput, DirectionInput, LevelTag, Location, LocationInput, PlanInput,
    PriceListFilter, SessionFilter, SessionInput, SessionTariff, TariffInput, TrainingDirection,
    TrainingPlan, TrainingSession,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/directions", get(list_directions).post(create_direction))
        .route(
            "/directions/{id}",
            get(get_direction).put(update_direction).delete(delete_direction),
        )
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
        .route("/levels", get(list_levels))
        .route("/coaches", get(list_coaches).post(create_coach))
        .route(
            "/coaches/{id}",
            get(get_coach).put(update_coach).delete(delete_coach),
        )
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/{id}", get(get_plan).put(update_plan).delete(delete_plan))
        .route("/tariffs", get(list_tariffs).post(create_tariff))
        .route(
            "/tariffs/{id}",
            get(get_tariff).put(update_tariff).delete(delete_tariff),
        )
        .route("/sessions", get(list_sessions).post(create_session))
        .route(
            "/sessions/{id}",
            get(get_session).put(update_session).delete(delete_session),
        )
}

// ---- directions ----

async fn list_directions(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrainingDirection>>, ApiError> {
    Ok(Json(state.training_service.list_directions().await?))
}

async fn get_direction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TrainingDirection>, ApiError> {
    Ok(Json(state.training_service.get_direction(id).await?))
}

async fn create_direction(
    State(state): State<AppState>,
    Json(body): Json<DirectionInput>,
) -> Result<(StatusCode, Json<TrainingDirection>), ApiError> {
    let direction = state.training_service.create_direction(&body).await?;
    Ok((StatusCode::CREATED, Json(direction)))
}

async fn update_direction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<DirectionInput>,
) -> Result<Json<TrainingDirection>, ApiError> {
    Ok(Json(state.training_service.update_direction(id, &body).await?))
}

async fn delete_direction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.training_service.delete_direction(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- locations ----

async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, ApiError> {
    Ok(Json(state.training_service.list_locations().await?))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Location>, ApiError> {
    Ok(Json(state.training_service.get_location(id).await?))
}

async fn create_location(
    State(state): State<AppState>,
    Json(body): Json<LocationInput>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    let location = state.training_service.create_location(&body).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<LocationInput>,
) -> Result<Json<Location>, ApiError> {
    Ok(Json(state.training_service.update_location(id, &body).await?))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.training_service.delete_location(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Levels are seeded and read-only
async fn list_levels(State(state): State<AppState>) -> Result<Json<Vec<LevelTag>>, ApiError> {
    Ok(Json(state.training_service.list_levels().await?))
}

// ---- coaches ----

async fn list_coaches(State(state): State<AppState>) -> Result<Json<Vec<Coach>>, ApiError> {
    Ok(Json(
        state
            .training_service
            .list_coaches(&CoachFilter::default())
            .await?,
    ))
}

async fn get_coach(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Coach>, ApiError> {
    Ok(Json(state.training_service.get_coach(id).await?))
}

async fn create_coach(
    State(state): State<AppState>,
    Json(body): Json<CoachInput>,
) -> Result<(StatusCode, Json<Coach>), ApiError> {
    let coach = state.training_service.create_coach(&body).await?;
    tracing::info!(coach_id = coach.id, slug = %coach.slug, "Coach created");
    Ok((StatusCode::CREATED, Json(coach)))
}

async fn update_coach(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CoachInput>,
) -> Result<Json<Coach>, ApiError> {
    Ok(Json(state.training_service.update_coach(id, &body).await?))
}

async fn delete_coach(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.training_service.delete_coach(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- price lists ----

async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<TrainingPlan>>, ApiError> {
    Ok(Json(
        state
            .training_service
            .list_plans(&PriceListFilter::default())
            .await?,
    ))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TrainingPlan>, ApiError> {
    Ok(Json(state.training_service.get_plan(id).await?))
}

async fn create_plan(
    State(state): State<AppState>,
    Json(body): Json<PlanInput>,
) -> Result<(StatusCode, Json<TrainingPlan>), ApiError> {
    let plan = state.training_service.create_plan(&body).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PlanInput>,
) -> Result<Json<TrainingPlan>, ApiError> {
    Ok(Json(state.training_service.update_plan(id, &body).await?))
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.training_service.delete_plan(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tariffs(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionTariff>>, ApiError> {
    Ok(Json(
        state
            .training_service
            .list_tariffs(&PriceListFilter::default())
            .await?,
    ))
}

async fn get_tariff(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SessionTariff>, ApiError> {
    Ok(Json(state.training_service.get_tariff(id).await?))
}

async fn create_tariff(
    State(state): State<AppState>,
    Json(body): Json<TariffInput>,
) -> Result<(StatusCode, Json<SessionTariff>), ApiError> {
    let tariff = state.training_service.create_tariff(&body).await?;
    Ok((StatusCode::CREATED, Json(tariff)))
}

async fn update_tariff(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TariffInput>,
) -> Result<Json<SessionTariff>, ApiError> {
    Ok(Json(state.training_service.update_tariff(id, &body).await?))
}

async fn delete_tariff(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.training_service.delete_tariff(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- schedule ----

async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrainingSession>>, ApiError> {
    Ok(Json(
        state
            .training_service
            .list_sessions(&SessionFilter::default())
            .await?,
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TrainingSession>, ApiError> {
    Ok(Json(state.training_service.get_session(id, None).await?))
}

async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<SessionInput>,
) -> Result<(StatusCode, Json<TrainingSession>), ApiError> {
    let session = state.training_service.create_session(&body).await?;
    tracing::info!(session_id = session.id, date = %session.date, "Session created");
    Ok((StatusCode::CREATED, Json(session)))
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SessionInput>,
) -> Result<Json<TrainingSession>, ApiError> {
    Ok(Json(state.training_service.update_session(id, &body).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.training_service.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
