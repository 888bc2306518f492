//! Site-wide models: contact block, club profile and lead requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact details shown in the site footer and contact page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub id: i64,
    pub title: String,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub email: String,
    pub address: String,
    pub map_url: String,
    pub working_hours: String,
    pub whatsapp: String,
    pub telegram: String,
    pub instagram: String,
    pub youtube: String,
    pub vk: String,
    /// Ordered by `order`, then `title`
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    pub id: i64,
    pub title: String,
    pub url: String,
    /// CSS class or emoji
    pub icon: String,
    pub order: i64,
}

/// Club "about" page and home page hero
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubProfile {
    pub id: i64,
    pub name: String,
    pub tagline: String,
    pub mission: String,
    pub story: String,
    pub founded_year: Option<i64>,
    pub hero_video: String,
    pub hero_description: String,
    pub seo_title: String,
    pub seo_description: String,
    #[serde(default)]
    pub hero_slides: Vec<HeroSlide>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroSlide {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    /// Stored media path, empty when unset
    pub image: String,
    pub order: i64,
}

/// Contact request submitted through the site form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRequest {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub preferred_direction: String,
    pub message: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Public lead form payload
///
/// Every field is optional at the wire level so validation can report all
/// problems at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub preferred_direction: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: String,
}

fn default_site_name() -> String {
    "Gabi Club".to_string()
}

/// Admin input for the contact block
#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    #[serde(default = "default_site_name")]
    pub title: String,
    #[serde(default)]
    pub phone_primary: String,
    #[serde(default)]
    pub phone_secondary: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub map_url: String,
    #[serde(default)]
    pub working_hours: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub telegram: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub youtube: String,
    #[serde(default)]
    pub vk: String,
    #[serde(default)]
    pub social_links: Vec<SocialLinkInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialLinkInput {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub order: i64,
}

/// Admin input for the club profile
#[derive(Debug, Clone, Deserialize)]
pub struct ClubInput {
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub founded_year: Option<i64>,
    #[serde(default)]
    pub hero_video: String,
    #[serde(default)]
    pub hero_description: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    #[serde(default)]
    pub hero_slides: Vec<HeroSlideInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeroSlideInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_input_defaults_title() {
        let input: ContactInput = serde_json::from_str(r#"{"phone_primary": "+7 900"}"#).unwrap();
        assert_eq!(input.title, "Gabi Club");
        assert!(input.social_links.is_empty());
    }

    #[test]
    fn test_lead_input_tolerates_missing_fields() {
        let input: LeadInput = serde_json::from_str(r#"{"full_name": "Анна"}"#).unwrap();
        assert_eq!(input.full_name, "Анна");
        assert!(input.email.is_empty());
        assert!(input.phone.is_empty());
    }
}
