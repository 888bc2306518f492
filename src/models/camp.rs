//! Camp models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::blog::GalleryImageInput;
use super::money::Money;
use super::training::Coach;

/// Camp publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampStatus {
    /// Not shown publicly
    Draft,
    /// Announced
    #[default]
    Upcoming,
    /// Already held
    Completed,
}

impl CampStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampStatus::Draft => "draft",
            CampStatus::Upcoming => "upcoming",
            CampStatus::Completed => "completed",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            CampStatus::Draft => "Черновик",
            CampStatus::Upcoming => "Анонс",
            CampStatus::Completed => "Проведён",
        }
    }
}

impl FromStr for CampStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampStatus::Draft),
            "upcoming" => Ok(CampStatus::Upcoming),
            "completed" => Ok(CampStatus::Completed),
            _ => Err(anyhow::anyhow!("Invalid camp status: {}", s)),
        }
    }
}

impl fmt::Display for CampStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training camp
///
/// Child collections and trainers are only loaded for single-camp lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camp {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_from: Money,
    pub location: String,
    pub hero_image: String,
    pub header_image: String,
    pub registration_link: String,
    pub status: CampStatus,
    pub is_featured: bool,
    pub logistics: String,
    pub target_audience: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub highlights: Vec<CampHighlight>,
    #[serde(default)]
    pub program: Vec<CampDay>,
    #[serde(default)]
    pub gallery: Vec<CampGalleryImage>,
    #[serde(default)]
    pub inclusions: Vec<CampInclusion>,
    #[serde(default)]
    pub trainers: Vec<Coach>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampHighlight {
    pub id: i64,
    pub text: String,
    pub order: i64,
}

/// One day of the camp program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampDay {
    pub id: i64,
    pub day_number: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampGalleryImage {
    pub id: i64,
    pub image: String,
    pub caption: String,
    pub order: i64,
}

/// Item included in the camp price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampInclusion {
    pub id: i64,
    pub text: String,
    pub order: i64,
}

/// Filter for camp listings
#[derive(Debug, Clone)]
pub struct CampFilter {
    pub status: Option<CampStatus>,
    pub featured: Option<bool>,
    /// `status = upcoming OR start_date >= today`
    pub upcoming: bool,
    /// `status = completed OR end_date < today`
    pub past: bool,
    pub today: NaiveDate,
    pub limit: Option<i64>,
}

impl CampFilter {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            status: None,
            featured: None,
            upcoming: false,
            past: false,
            today,
            limit: None,
        }
    }
}

/// Admin input for creating or replacing a camp
#[derive(Debug, Clone, Deserialize)]
pub struct CampInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_from: Money,
    pub location: String,
    #[serde(default)]
    pub hero_image: String,
    #[serde(default)]
    pub header_image: String,
    #[serde(default)]
    pub registration_link: String,
    #[serde(default)]
    pub status: CampStatus,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub logistics: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub highlights: Vec<TextItemInput>,
    #[serde(default)]
    pub program: Vec<CampDayInput>,
    #[serde(default)]
    pub gallery: Vec<GalleryImageInput>,
    #[serde(default)]
    pub inclusions: Vec<TextItemInput>,
    #[serde(default)]
    pub trainer_ids: Vec<i64>,
}

/// Ordered line of text (highlights, inclusions)
#[derive(Debug, Clone, Deserialize)]
pub struct TextItemInput {
    pub text: String,
    #[serde(default)]
    pub order: i64,
}

fn default_day_number() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampDayInput {
    #[serde(default = "default_day_number")]
    pub day_number: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [CampStatus::Draft, CampStatus::Upcoming, CampStatus::Completed] {
            assert_eq!(status.as_str().parse::<CampStatus>().unwrap(), status);
        }
        assert!("archived".parse::<CampStatus>().is_err());
        assert_eq!(CampStatus::default(), CampStatus::Upcoming);
        assert_eq!(CampStatus::Completed.label(), "Проведён");
    }

    #[test]
    fn test_camp_input_defaults() {
        let input: CampInput = serde_json::from_str(
            r#"{"title": "Кэмп в горах", "description": "Неделя тренировок",
                "start_date": "2026-07-01", "end_date": "2026-07-07",
                "price_from": "45000", "location": "Сочи",
                "program": [{"title": "Заезд"}]}"#,
        )
        .unwrap();
        assert_eq!(input.status, CampStatus::Upcoming);
        assert_eq!(input.price_from.to_string(), "45000.00");
        assert_eq!(input.program[0].day_number, 1);
        assert!(input.trainer_ids.is_empty());
    }
}
