//! Site service: contact block and club profile

use crate::db::repositories::SiteRepository;
use crate::models::{ClubInput, ClubProfile, ContactInfo, ContactInput};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SiteServiceError {
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct SiteService {
    repo: Arc<dyn SiteRepository>,
}

impl SiteService {
    pub fn new(repo: Arc<dyn SiteRepository>) -> Self {
        Self { repo }
    }

    /// Contact block shown on the site, if one was saved
    pub async fn contact(&self) -> Result<Option<ContactInfo>, SiteServiceError> {
        Ok(self
            .repo
            .latest_contact()
            .await
            .context("Failed to load contact block")?)
    }

    /// Club profile shown on the site, if one was saved
    pub async fn club(&self) -> Result<Option<ClubProfile>, SiteServiceError> {
        Ok(self
            .repo
            .first_club()
            .await
            .context("Failed to load club profile")?)
    }

    pub async fn save_contact(&self, input: &ContactInput) -> Result<ContactInfo, SiteServiceError> {
        validate_contact(input).map_err(SiteServiceError::ValidationError)?;
        let contact = self
            .repo
            .upsert_contact(input)
            .await
            .context("Failed to save contact block")?;
        tracing::info!(contact_id = contact.id, "Contact block saved");
        Ok(contact)
    }

    pub async fn save_club(&self, input: &ClubInput) -> Result<ClubProfile, SiteServiceError> {
        validate_club(input).map_err(SiteServiceError::ValidationError)?;
        let club = self
            .repo
            .upsert_club(input)
            .await
            .context("Failed to save club profile")?;
        tracing::info!(club_id = club.id, "Club profile saved");
        Ok(club)
    }
}

fn validate_contact(input: &ContactInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.require("title", &input.title);
    errors.max_chars("title", &input.title, 120);
    errors.max_chars("phone_primary", &input.phone_primary, 30);
    errors.max_chars("phone_secondary", &input.phone_secondary, 30);
    errors.email("email", &input.email);
    errors.max_chars("address", &input.address, 255);
    errors.max_chars("map_url", &input.map_url, 255);
    errors.max_chars("working_hours", &input.working_hours, 150);
    for (field, value) in [
        ("whatsapp", &input.whatsapp),
        ("telegram", &input.telegram),
        ("instagram", &input.instagram),
        ("youtube", &input.youtube),
        ("vk", &input.vk),
    ] {
        errors.max_chars(field, value, 120);
    }

    for (i, link) in input.social_links.iter().enumerate() {
        let title = format!("social_links[{}].title", i);
        let url = format!("social_links[{}].url", i);
        errors.require(&title, &link.title);
        errors.max_chars(&title, &link.title, 60);
        errors.require(&url, &link.url);
        errors.max_chars(&url, &link.url, 255);
    }

    errors.into_result()
}

fn validate_club(input: &ClubInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.require("name", &input.name);
    errors.max_chars("name", &input.name, 160);
    errors.max_chars("tagline", &input.tagline, 200);
    errors.max_chars("hero_video", &input.hero_video, 255);
    errors.max_chars("seo_title", &input.seo_title, 200);
    if let Some(year) = input.founded_year {
        if !(1800..=9999).contains(&year) {
            errors.add("founded_year", "Укажите корректный год.");
        }
    }

    for (i, slide) in input.hero_slides.iter().enumerate() {
        errors.max_chars(&format!("hero_slides[{}].title", i), &slide.title, 120);
        errors.max_chars(&format!("hero_slides[{}].subtitle", i), &slide.subtitle, 200);
    }

    errors.into_result()
}
