//! Camp service

use crate::db::repositories::{CampRepository, CoachRepository};
use crate::models::{Camp, CampFilter, CampInput};
use crate::services::slug::{explicit_slug, unique_slug};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use std::sync::Arc;

const CAMP_SLUG_MAX: usize = 220;

/// Camps shown in the featured block
pub const FEATURED_LIMIT: i64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum CampServiceError {
    #[error("Camp not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CampService {
    camps: Arc<dyn CampRepository>,
    coaches: Arc<dyn CoachRepository>,
}

impl CampService {
    pub fn new(camps: Arc<dyn CampRepository>, coaches: Arc<dyn CoachRepository>) -> Self {
        Self { camps, coaches }
    }

    pub async fn list(&self, filter: &CampFilter) -> Result<Vec<Camp>, CampServiceError> {
        Ok(self.camps.list(filter).await.context("Failed to list camps")?)
    }

    /// Featured camps after the same filters as the listing, at most three
    pub async fn featured(&self, filter: &CampFilter) -> Result<Vec<Camp>, CampServiceError> {
        let mut filter = filter.clone();
        filter.featured = Some(true);
        filter.limit = Some(FEATURED_LIMIT);
        self.list(&filter).await
    }

    /// Camp by slug
    pub async fn get_public(&self, slug: &str) -> Result<Camp, CampServiceError> {
        self.camps
            .get_by_slug(slug)
            .await
            .context("Failed to get camp")?
            .ok_or_else(|| CampServiceError::NotFound(slug.to_string()))
    }

    pub async fn get(&self, id: i64) -> Result<Camp, CampServiceError> {
        self.camps
            .get_by_id(id)
            .await
            .context("Failed to get camp")?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, input: &CampInput) -> Result<Camp, CampServiceError> {
        self.validate(input).await?;
        let slug = self.slug_for(input, None, None).await?;

        let camp = self
            .camps
            .create(&slug, input)
            .await
            .context("Failed to create camp")?;
        tracing::info!(camp_id = camp.id, slug = %camp.slug, "Camp created");
        Ok(camp)
    }

    pub async fn update(&self, id: i64, input: &CampInput) -> Result<Camp, CampServiceError> {
        let current = self.get(id).await?;
        self.validate(input).await?;
        let slug = self.slug_for(input, Some(id), Some(current.slug)).await?;

        self.camps
            .update(id, &slug, input)
            .await
            .context("Failed to update camp")?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), CampServiceError> {
        if !self.camps.delete(id).await.context("Failed to delete camp")? {
            return Err(not_found(id));
        }
        tracing::info!(camp_id = id, "Camp deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, CampServiceError> {
        Ok(self.camps.count().await?)
    }

    async fn validate(&self, input: &CampInput) -> Result<(), CampServiceError> {
        let mut errors = FieldErrors::new();

        errors.require("title", &input.title);
        errors.max_chars("title", &input.title, 200);
        errors.require("description", &input.description);
        errors.require("location", &input.location);
        errors.max_chars("location", &input.location, 255);
        errors.max_chars("registration_link", &input.registration_link, 200);
        if !input.price_from.fits(8) {
            errors.add(
                "price_from",
                "Убедитесь, что в числе не более 8 цифр.",
            );
        }
        if input.end_date < input.start_date {
            errors.add("end_date", "Дата окончания не может быть раньше даты начала.");
        }

        for (i, item) in input.highlights.iter().enumerate() {
            let field = format!("highlights[{}].text", i);
            errors.require(&field, &item.text);
            errors.max_chars(&field, &item.text, 200);
        }
        for (i, day) in input.program.iter().enumerate() {
            errors.max_chars(&format!("program[{}].title", i), &day.title, 120);
            if day.day_number < 1 {
                errors.add(
                    &format!("program[{}].day_number", i),
                    "Номер дня должен быть положительным.",
                );
            }
        }
        for (i, image) in input.gallery.iter().enumerate() {
            errors.require(&format!("gallery[{}].image", i), &image.image);
            errors.max_chars(&format!("gallery[{}].caption", i), &image.caption, 150);
        }
        for (i, item) in input.inclusions.iter().enumerate() {
            let field = format!("inclusions[{}].text", i);
            errors.require(&field, &item.text);
            errors.max_chars(&field, &item.text, 200);
        }

        let missing = self
            .coaches
            .missing(&input.trainer_ids)
            .await
            .context("Failed to check trainers")?;
        for id in missing {
            errors.add("trainer_ids", format!("Тренер с id {} не найден.", id));
        }

        errors.into_result().map_err(CampServiceError::ValidationError)
    }

    async fn slug_for(
        &self,
        input: &CampInput,
        exclude_id: Option<i64>,
        current: Option<String>,
    ) -> Result<String, CampServiceError> {
        if let Some(slug) = explicit_slug(input.slug.as_deref(), CAMP_SLUG_MAX) {
            if self.camps.slug_taken(&slug, exclude_id).await? {
                return Err(CampServiceError::Conflict(format!(
                    "Camp slug '{}' is already taken",
                    slug
                )));
            }
            return Ok(slug);
        }
        if let Some(current) = current {
            return Ok(current);
        }

        let camps = self.camps.clone();
        Ok(
            unique_slug(&input.title, "camp", CAMP_SLUG_MAX, move |candidate| {
                let camps = camps.clone();
                async move { camps.slug_taken(&candidate, exclude_id).await }
            })
            .await?,
        )
    }
}

fn not_found(id: i64) -> CampServiceError {
    CampServiceError::NotFound(format!("Camp with ID {} not found", id))
}
