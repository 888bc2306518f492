//! Training service
//!
//! Catalog (directions, locations, levels), coaches, price lists and the
//! session schedule. Public reads and admin writes go through the same
//! service; the API layer decides which routes need a login.

use crate::db::repositories::{
    CatalogRepository, CoachRepository, PricingRepository, ScheduleRepository,
};
use crate::models::{
    Coach, CoachFilter, CoachInput, DirectionInput, LevelTag, Location,
    LocationInput, PlanInput, PriceListFilter, SessionFilter, SessionInput, SessionTariff,
    TariffInput, TrainingDirection, TrainingPlan, TrainingSession,
};
use crate::services::slug::{explicit_slug, unique_slug};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

const COACH_SLUG_MAX: usize = 140;

#[derive(Debug, thiserror::Error)]
pub enum TrainingServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Everything the schedule filter bar needs in one response
#[derive(Debug, Clone, Serialize)]
pub struct TrainingMeta {
    pub directions: Vec<TrainingDirection>,
    pub coaches: Vec<Coach>,
    pub locations: Vec<Location>,
    pub levels: Vec<LevelTag>,
}

pub struct TrainingService {
    catalog: Arc<dyn CatalogRepository>,
    coaches: Arc<dyn CoachRepository>,
    pricing: Arc<dyn PricingRepository>,
    schedule: Arc<dyn ScheduleRepository>,
}

impl TrainingService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        coaches: Arc<dyn CoachRepository>,
        pricing: Arc<dyn PricingRepository>,
        schedule: Arc<dyn ScheduleRepository>,
    ) -> Self {
        Self {
            catalog,
            coaches,
            pricing,
            schedule,
        }
    }

    // ---- catalog ----

    pub async fn list_directions(&self) -> Result<Vec<TrainingDirection>, TrainingServiceError> {
        Ok(self
            .catalog
            .list_directions()
            .await
            .context("Failed to list directions")?)
    }

    pub async fn get_direction(&self, id: i64) -> Result<TrainingDirection, TrainingServiceError> {
        self.catalog
            .get_direction(id)
            .await
            .context("Failed to get direction")?
            .ok_or_else(|| not_found("Direction", id))
    }

    pub async fn create_direction(
        &self,
        input: &DirectionInput,
    ) -> Result<TrainingDirection, TrainingServiceError> {
        validate_direction(input)?;
        Ok(self
            .catalog
            .create_direction(input)
            .await
            .context("Failed to create direction")?)
    }

    pub async fn update_direction(
        &self,
        id: i64,
        input: &DirectionInput,
    ) -> Result<TrainingDirection, TrainingServiceError> {
        validate_direction(input)?;
        self.catalog
            .update_direction(id, input)
            .await
            .context("Failed to update direction")?
            .ok_or_else(|| not_found("Direction", id))
    }

    pub async fn delete_direction(&self, id: i64) -> Result<(), TrainingServiceError> {
        if !self
            .catalog
            .delete_direction(id)
            .await
            .context("Failed to delete direction")?
        {
            return Err(not_found("Direction", id));
        }
        Ok(())
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, TrainingServiceError> {
        Ok(self
            .catalog
            .list_locations()
            .await
            .context("Failed to list locations")?)
    }

    pub async fn get_location(&self, id: i64) -> Result<Location, TrainingServiceError> {
        self.catalog
            .get_location(id)
            .await
            .context("Failed to get location")?
            .ok_or_else(|| not_found("Location", id))
    }

    pub async fn create_location(
        &self,
        input: &LocationInput,
    ) -> Result<Location, TrainingServiceError> {
        validate_location(input)?;
        Ok(self
            .catalog
            .create_location(input)
            .await
            .context("Failed to create location")?)
    }

    pub async fn update_location(
        &self,
        id: i64,
        input: &LocationInput,
    ) -> Result<Location, TrainingServiceError> {
        validate_location(input)?;
        self.catalog
            .update_location(id, input)
            .await
            .context("Failed to update location")?
            .ok_or_else(|| not_found("Location", id))
    }

    pub async fn delete_location(&self, id: i64) -> Result<(), TrainingServiceError> {
        if !self
            .catalog
            .delete_location(id)
            .await
            .context("Failed to delete location")?
        {
            return Err(not_found("Location", id));
        }
        Ok(())
    }

    pub async fn list_levels(&self) -> Result<Vec<LevelTag>, TrainingServiceError> {
        Ok(self.catalog.list_levels().await.context("Failed to list levels")?)
    }

    /// Directions, coaches, locations and levels for filter widgets
    pub async fn meta(&self) -> Result<TrainingMeta, TrainingServiceError> {
        Ok(TrainingMeta {
            directions: self.list_directions().await?,
            coaches: self.list_coaches(&CoachFilter::default()).await?,
            locations: self.list_locations().await?,
            levels: self.list_levels().await?,
        })
    }

    // ---- coaches ----

    pub async fn list_coaches(&self, filter: &CoachFilter) -> Result<Vec<Coach>, TrainingServiceError> {
        Ok(self
            .coaches
            .list(filter)
            .await
            .context("Failed to list coaches")?)
    }

    pub async fn get_coach(&self, id: i64) -> Result<Coach, TrainingServiceError> {
        self.coaches
            .get_by_id(id)
            .await
            .context("Failed to get coach")?
            .ok_or_else(|| not_found("Coach", id))
    }

    pub async fn create_coach(&self, input: &CoachInput) -> Result<Coach, TrainingServiceError> {
        self.validate_coach(input).await?;
        let slug = self.coach_slug(input, None, None).await?;

        let coach = self
            .coaches
            .create(&slug, input)
            .await
            .context("Failed to create coach")?;
        tracing::info!(coach_id = coach.id, slug = %coach.slug, "Coach created");
        Ok(coach)
    }

    pub async fn update_coach(
        &self,
        id: i64,
        input: &CoachInput,
    ) -> Result<Coach, TrainingServiceError> {
        let current = self.get_coach(id).await?;
        self.validate_coach(input).await?;
        let slug = self.coach_slug(input, Some(id), Some(current.slug)).await?;

        self.coaches
            .update(id, &slug, input)
            .await
            .context("Failed to update coach")?
            .ok_or_else(|| not_found("Coach", id))
    }

    pub async fn delete_coach(&self, id: i64) -> Result<(), TrainingServiceError> {
        if !self.coaches.delete(id).await.context("Failed to delete coach")? {
            return Err(not_found("Coach", id));
        }
        tracing::info!(coach_id = id, "Coach deleted");
        Ok(())
    }

    pub async fn count_coaches(&self) -> Result<i64, TrainingServiceError> {
        Ok(self.coaches.count().await?)
    }

    // ---- price lists ----

    pub async fn list_plans(
        &self,
        filter: &PriceListFilter,
    ) -> Result<Vec<TrainingPlan>, TrainingServiceError> {
        Ok(self
            .pricing
            .list_plans(filter)
            .await
            .context("Failed to list plans")?)
    }

    pub async fn get_plan(&self, id: i64) -> Result<TrainingPlan, TrainingServiceError> {
        self.pricing
            .get_plan(id)
            .await
            .context("Failed to get plan")?
            .ok_or_else(|| not_found("Plan", id))
    }

    pub async fn create_plan(&self, input: &PlanInput) -> Result<TrainingPlan, TrainingServiceError> {
        validate_plan(input)?;
        Ok(self
            .pricing
            .create_plan(input)
            .await
            .context("Failed to create plan")?)
    }

    pub async fn update_plan(
        &self,
        id: i64,
        input: &PlanInput,
    ) -> Result<TrainingPlan, TrainingServiceError> {
        validate_plan(input)?;
        self.pricing
            .update_plan(id, input)
            .await
            .context("Failed to update plan")?
            .ok_or_else(|| not_found("Plan", id))
    }

    pub async fn delete_plan(&self, id: i64) -> Result<(), TrainingServiceError> {
        if !self.pricing.delete_plan(id).await.context("Failed to delete plan")? {
            return Err(not_found("Plan", id));
        }
        Ok(())
    }

    pub async fn list_tariffs(
        &self,
        filter: &PriceListFilter,
    ) -> Result<Vec<SessionTariff>, TrainingServiceError> {
        Ok(self
            .pricing
            .list_tariffs(filter)
            .await
            .context("Failed to list tariffs")?)
    }

    pub async fn get_tariff(&self, id: i64) -> Result<SessionTariff, TrainingServiceError> {
        self.pricing
            .get_tariff(id)
            .await
            .context("Failed to get tariff")?
            .ok_or_else(|| not_found("Tariff", id))
    }

    pub async fn create_tariff(
        &self,
        input: &TariffInput,
    ) -> Result<SessionTariff, TrainingServiceError> {
        validate_tariff(input)?;
        Ok(self
            .pricing
            .create_tariff(input)
            .await
            .context("Failed to create tariff")?)
    }

    pub async fn update_tariff(
        &self,
        id: i64,
        input: &TariffInput,
    ) -> Result<SessionTariff, TrainingServiceError> {
        validate_tariff(input)?;
        self.pricing
            .update_tariff(id, input)
            .await
            .context("Failed to update tariff")?
            .ok_or_else(|| not_found("Tariff", id))
    }

    pub async fn delete_tariff(&self, id: i64) -> Result<(), TrainingServiceError> {
        if !self
            .pricing
            .delete_tariff(id)
            .await
            .context("Failed to delete tariff")?
        {
            return Err(not_found("Tariff", id));
        }
        Ok(())
    }

    // ---- schedule ----

    pub async fn list_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<Vec<TrainingSession>, TrainingServiceError> {
        Ok(self
            .schedule
            .list(filter)
            .await
            .context("Failed to list sessions")?)
    }

    /// Session by id; with a filter, a session outside it is not found
    pub async fn get_session(
        &self,
        id: i64,
        filter: Option<&SessionFilter>,
    ) -> Result<TrainingSession, TrainingServiceError> {
        self.schedule
            .get(id, filter)
            .await
            .context("Failed to get session")?
            .ok_or_else(|| not_found("Session", id))
    }

    pub async fn create_session(
        &self,
        input: &SessionInput,
    ) -> Result<TrainingSession, TrainingServiceError> {
        self.validate_session(input).await?;
        let session = self
            .schedule
            .create(input)
            .await
            .context("Failed to create session")?;
        tracing::info!(session_id = session.id, date = %session.date, "Session created");
        Ok(session)
    }

    pub async fn update_session(
        &self,
        id: i64,
        input: &SessionInput,
    ) -> Result<TrainingSession, TrainingServiceError> {
        self.validate_session(input).await?;
        self.schedule
            .update(id, input)
            .await
            .context("Failed to update session")?
            .ok_or_else(|| not_found("Session", id))
    }

    pub async fn delete_session(&self, id: i64) -> Result<(), TrainingServiceError> {
        if !self
            .schedule
            .delete(id)
            .await
            .context("Failed to delete session")?
        {
            return Err(not_found("Session", id));
        }
        Ok(())
    }

    pub async fn count_sessions(&self) -> Result<i64, TrainingServiceError> {
        Ok(self.schedule.count().await?)
    }

    async fn validate_coach(&self, input: &CoachInput) -> Result<(), TrainingServiceError> {
        let mut errors = FieldErrors::new();

        errors.require("full_name", &input.full_name);
        errors.max_chars("full_name", &input.full_name, 120);
        errors.max_chars("role", &input.role, 120);
        errors.max_chars("instagram", &input.instagram, 200);
        errors.max_chars("telegram", &input.telegram, 120);
        errors.max_chars("phone", &input.phone, 32);
        errors.email("email", &input.email);
        if input.experience_years < 0 {
            errors.add("experience_years", "Значение должно быть неотрицательным.");
        }

        let missing = self
            .catalog
            .missing_directions(&input.direction_ids)
            .await
            .context("Failed to check directions")?;
        for id in missing {
            errors.add("direction_ids", format!("Направление с id {} не найдено.", id));
        }

        errors.into_result().map_err(TrainingServiceError::ValidationError)
    }

    async fn validate_session(&self, input: &SessionInput) -> Result<(), TrainingServiceError> {
        let mut errors = FieldErrors::new();

        errors.max_chars("title", &input.title, 160);
        errors.max_chars("intensity", &input.intensity, 80);
        errors.max_chars("color", &input.color, 20);
        if input.end_time <= input.start_time {
            errors.add("end_time", "Время окончания должно быть позже времени начала.");
        }
        if input.spots_total < 0 {
            errors.add("spots_total", "Значение должно быть неотрицательным.");
        }
        if input.spots_available < 0 {
            errors.add("spots_available", "Значение должно быть неотрицательным.");
        }
        if input.spots_available > input.spots_total {
            errors.add(
                "spots_available",
                "Свободных мест не может быть больше, чем всего мест.",
            );
        }
        for (i, attachment) in input.attachments.iter().enumerate() {
            errors.require(&format!("attachments[{}].file", i), &attachment.file);
            errors.max_chars(&format!("attachments[{}].title", i), &attachment.title, 120);
        }

        if !self
            .catalog
            .missing_directions(&[input.direction_id])
            .await
            .context("Failed to check direction")?
            .is_empty()
        {
            errors.add("direction_id", "Направление не найдено.");
        }
        if self
            .catalog
            .get_location(input.location_id)
            .await
            .context("Failed to check location")?
            .is_none()
        {
            errors.add("location_id", "Локация не найдена.");
        }
        if let Some(coach_id) = input.coach_id {
            if !self
                .coaches
                .missing(&[coach_id])
                .await
                .context("Failed to check coach")?
                .is_empty()
            {
                errors.add("coach_id", "Тренер не найден.");
            }
        }
        let missing = self
            .catalog
            .missing_levels(&input.level_ids)
            .await
            .context("Failed to check levels")?;
        for id in missing {
            errors.add("level_ids", format!("Уровень с id {} не найден.", id));
        }

        errors.into_result().map_err(TrainingServiceError::ValidationError)
    }

    async fn coach_slug(
        &self,
        input: &CoachInput,
        exclude_id: Option<i64>,
        current: Option<String>,
    ) -> Result<String, TrainingServiceError> {
        if let Some(slug) = explicit_slug(input.slug.as_deref(), COACH_SLUG_MAX) {
            if self.coaches.slug_taken(&slug, exclude_id).await? {
                return Err(TrainingServiceError::Conflict(format!(
                    "Coach slug '{}' is already taken",
                    slug
                )));
            }
            return Ok(slug);
        }
        if let Some(current) = current {
            return Ok(current);
        }

        let coaches = self.coaches.clone();
        Ok(
            unique_slug(&input.full_name, "coach", COACH_SLUG_MAX, move |candidate| {
                let coaches = coaches.clone();
                async move { coaches.slug_taken(&candidate, exclude_id).await }
            })
            .await?,
        )
    }
}

fn not_found(what: &str, id: i64) -> TrainingServiceError {
    TrainingServiceError::NotFound(format!("{} with ID {} not found", what, id))
}

fn validate_direction(input: &DirectionInput) -> Result<(), TrainingServiceError> {
    let mut errors = FieldErrors::new();
    errors.require("title", &input.title);
    errors.max_chars("title", &input.title, 100);
    errors.max_chars("icon", &input.icon, 120);
    errors.into_result().map_err(TrainingServiceError::ValidationError)
}

fn validate_location(input: &LocationInput) -> Result<(), TrainingServiceError> {
    let mut errors = FieldErrors::new();
    errors.require("title", &input.title);
    errors.max_chars("title", &input.title, 150);
    errors.max_chars("address", &input.address, 255);
    if let Some(lat) = input.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            errors.add("latitude", "Широта должна быть в диапазоне от -90 до 90.");
        }
    }
    if let Some(lon) = input.longitude {
        if !(-180.0..=180.0).contains(&lon) {
            errors.add("longitude", "Долгота должна быть в диапазоне от -180 до 180.");
        }
    }
    errors.into_result().map_err(TrainingServiceError::ValidationError)
}

fn validate_plan(input: &PlanInput) -> Result<(), TrainingServiceError> {
    let mut errors = FieldErrors::new();
    errors.require("title", &input.title);
    errors.max_chars("title", &input.title, 160);
    errors.max_chars("icon", &input.icon, 120);
    errors.max_chars("period", &input.period, 80);
    errors.max_chars("buy_label", &input.buy_label, 60);
    if !input.price.fits(9) {
        errors.add("price", "Убедитесь, что в числе не более 9 цифр.");
    }
    for (i, benefit) in input.benefits.iter().enumerate() {
        let field = format!("benefits[{}].text", i);
        errors.require(&field, &benefit.text);
        errors.max_chars(&field, &benefit.text, 200);
    }
    errors.into_result().map_err(TrainingServiceError::ValidationError)
}

fn validate_tariff(input: &TariffInput) -> Result<(), TrainingServiceError> {
    let mut errors = FieldErrors::new();
    errors.require("title", &input.title);
    errors.max_chars("title", &input.title, 160);
    for (i, price) in input.prices.iter().enumerate() {
        let field = format!("prices[{}].label", i);
        errors.require(&field, &price.label);
        errors.max_chars(&field, &price.label, 120);
        if !price.price.fits(9) {
            errors.add(
                &format!("prices[{}].price", i),
                "Убедитесь, что в числе не более 9 цифр.",
            );
        }
    }
    errors.into_result().map_err(TrainingServiceError::ValidationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCatalogRepository, SqlxCoachRepository, SqlxPricingRepository,
        SqlxScheduleRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::Money;

    async fn setup() -> TrainingService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TrainingService::new(
            SqlxCatalogRepository::boxed(pool.clone()),
            SqlxCoachRepository::boxed(pool.clone()),
            SqlxPricingRepository::boxed(pool.clone()),
            SqlxScheduleRepository::boxed(pool),
        )
    }

    async fn catalog(service: &TrainingService) -> (i64, i64) {
        let direction = service
            .create_direction(&DirectionInput {
                title: "Бег".to_string(),
                description: String::new(),
                icon: String::new(),
            })
            .await
            .unwrap();
        let location = service
            .create_location(&LocationInput {
                title: "Стадион".to_string(),
                address: String::new(),
                latitude: Some(55.75),
                longitude: Some(37.61),
            })
            .await
            .unwrap();
        (direction.id, location.id)
    }

    fn session(direction_id: i64, location_id: i64) -> SessionInput {
        serde_json::from_value(serde_json::json!({
            "title": "Интервалы",
            "date": "2026-05-10",
            "start_time": "07:00",
            "end_time": "08:30",
            "direction_id": direction_id,
            "location_id": location_id,
            "spots_total": 10,
            "spots_available": 4,
        }))
        .unwrap()
    }

    fn coach(name: &str) -> CoachInput {
        serde_json::from_value(serde_json::json!({"full_name": name})).unwrap()
    }

    #[tokio::test]
    async fn test_session_invariants() {
        let service = setup().await;
        let (direction_id, location_id) = catalog(&service).await;

        let mut input = session(direction_id, location_id);
        input.end_time = input.start_time;
        input.spots_available = 11;
        match service.create_session(&input).await {
            Err(TrainingServiceError::ValidationError(errors)) => {
                assert!(errors.get("end_time").is_some());
                assert!(errors.get("spots_available").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let created = service
            .create_session(&session(direction_id, location_id))
            .await
            .unwrap();
        assert_eq!(created.duration_minutes(), 90);
        assert!(created.is_open());
    }

    #[tokio::test]
    async fn test_session_references_checked() {
        let service = setup().await;
        let mut input = session(404, 405);
        input.coach_id = Some(406);
        input.level_ids = vec![1, 99];

        match service.create_session(&input).await {
            Err(TrainingServiceError::ValidationError(errors)) => {
                assert!(errors.get("direction_id").is_some());
                assert!(errors.get("location_id").is_some());
                assert!(errors.get("coach_id").is_some());
                assert_eq!(errors.get("level_ids").map(|m| m.len()), Some(1));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_coach_slugs() {
        let service = setup().await;
        let first = service.create_coach(&coach("Иван Петров")).await.unwrap();
        let second = service.create_coach(&coach("Иван Петров")).await.unwrap();
        assert_eq!(first.slug, "иван-петров");
        assert_eq!(second.slug, "иван-петров-2");

        let mut input = coach("Иван Петров");
        input.slug = Some("иван-петров".to_string());
        assert!(matches!(
            service.update_coach(second.id, &input).await,
            Err(TrainingServiceError::Conflict(_))
        ));

        let mut input = coach("Иван");
        input.direction_ids = vec![12];
        assert!(matches!(
            service.create_coach(&input).await,
            Err(TrainingServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_meta_collects_catalog() {
        let service = setup().await;
        catalog(&service).await;
        service.create_coach(&coach("Анна")).await.unwrap();

        let meta = service.meta().await.unwrap();
        assert_eq!(meta.directions.len(), 1);
        assert_eq!(meta.coaches.len(), 1);
        assert_eq!(meta.locations.len(), 1);
        assert_eq!(meta.levels.len(), 4);
    }

    #[tokio::test]
    async fn test_plan_price_digits() {
        let service = setup().await;
        let mut input: PlanInput =
            serde_json::from_value(serde_json::json!({"title": "Абонемент", "price": "3500"}))
                .unwrap();
        assert!(service.create_plan(&input).await.is_ok());

        input.price = Money::from_minor(1_000_000_000);
        assert!(matches!(
            service.create_plan(&input).await,
            Err(TrainingServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_location_coordinates_checked() {
        let service = setup().await;
        let input = LocationInput {
            title: "Где-то".to_string(),
            address: String::new(),
            latitude: Some(123.0),
            longitude: None,
        };
        assert!(matches!(
            service.create_location(&input).await,
            Err(TrainingServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.delete_location(999).await,
            Err(TrainingServiceError::NotFound(_))
        ));
    }
}
