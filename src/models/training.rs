//! Training models
//!
//! Directions, locations, levels, coaches, price lists and the session
//! schedule, plus the filters and admin inputs that go with them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::money::Money;

/// Training discipline such as running or cycling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDirection {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub icon: String,
}

/// Venue where sessions take place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub title: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Skill level a session is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
    Any,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
            Level::Any => "any",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Level::Beginner => "Начальный",
            Level::Intermediate => "Средний",
            Level::Advanced => "Продвинутый",
            Level::Any => "Любой уровень",
        }
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            "any" => Ok(Level::Any),
            _ => Err(anyhow::anyhow!("Invalid level: {}", s)),
        }
    }
}

/// Level row as stored in `level_tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTag {
    pub id: i64,
    pub tag: Level,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coach {
    pub id: i64,
    pub full_name: String,
    pub slug: String,
    pub role: String,
    pub bio: String,
    pub achievements: String,
    pub experience_years: i64,
    /// Stored media path, empty when unset
    pub photo: String,
    pub instagram: String,
    pub telegram: String,
    pub phone: String,
    pub email: String,
    pub is_featured: bool,
    #[serde(default)]
    pub directions: Vec<TrainingDirection>,
}

/// Price list category shared by plans and session tariffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    Personal,
    MiniGroup,
    Athlete,
    Kids,
}

impl PlanCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanCategory::Personal => "personal",
            PlanCategory::MiniGroup => "mini_group",
            PlanCategory::Athlete => "athlete",
            PlanCategory::Kids => "kids",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanCategory::Personal => "Индивидуальные outdoor",
            PlanCategory::MiniGroup => "Мини-группы",
            PlanCategory::Athlete => "Группы для спортсменов",
            PlanCategory::Kids => "Группы для детей",
        }
    }
}

impl FromStr for PlanCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(PlanCategory::Personal),
            "mini_group" => Ok(PlanCategory::MiniGroup),
            "athlete" => Ok(PlanCategory::Athlete),
            "kids" => Ok(PlanCategory::Kids),
            _ => Err(anyhow::anyhow!("Invalid category: {}", s)),
        }
    }
}

/// Storage form of an optional category: blank string when unset
pub fn category_str(category: Option<PlanCategory>) -> &'static str {
    category.map(|c| c.as_str()).unwrap_or("")
}

/// Display label of an optional category: blank string when unset
pub fn category_label(category: Option<PlanCategory>) -> &'static str {
    category.map(|c| c.label()).unwrap_or("")
}

fn serialize_category<S: Serializer>(
    category: &Option<PlanCategory>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(category_str(*category))
}

fn deserialize_category<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<PlanCategory>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Parse a stored category column
pub fn parse_category(raw: &str) -> Option<PlanCategory> {
    raw.parse().ok()
}

/// Subscription plan shown on the pricing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: i64,
    pub title: String,
    #[serde(
        serialize_with = "serialize_category",
        deserialize_with = "deserialize_category",
        default
    )]
    pub category: Option<PlanCategory>,
    pub icon: String,
    pub description: String,
    pub price: Money,
    pub period: String,
    pub buy_link: String,
    pub buy_label: String,
    pub is_featured: bool,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub benefits: Vec<PlanBenefit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanBenefit {
    pub id: i64,
    pub text: String,
    pub order: i64,
}

/// Priced set of single-session options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTariff {
    pub id: i64,
    pub title: String,
    #[serde(
        serialize_with = "serialize_category",
        deserialize_with = "deserialize_category",
        default
    )]
    pub category: Option<PlanCategory>,
    pub description: String,
    pub is_featured: bool,
    pub order: i64,
    #[serde(default)]
    pub prices: Vec<TariffPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffPrice {
    pub id: i64,
    pub label: String,
    pub price: Money,
    pub order: i64,
}

/// Session format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingType {
    #[default]
    Group,
    MiniGroup,
    Open,
    Personal,
}

impl TrainingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingType::Group => "group",
            TrainingType::MiniGroup => "mini_group",
            TrainingType::Open => "open",
            TrainingType::Personal => "personal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrainingType::Group => "Групповая",
            TrainingType::MiniGroup => "Мини-группа",
            TrainingType::Open => "Открытая",
            TrainingType::Personal => "Индивидуальная",
        }
    }
}

impl FromStr for TrainingType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group" => Ok(TrainingType::Group),
            "mini_group" => Ok(TrainingType::MiniGroup),
            "open" => Ok(TrainingType::Open),
            "personal" => Ok(TrainingType::Personal),
            _ => Err(anyhow::anyhow!("Invalid training type: {}", s)),
        }
    }
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduled training session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub session_type: TrainingType,
    pub direction: TrainingDirection,
    /// Cleared when the coach is deleted
    pub coach: Option<Coach>,
    pub location: Location,
    #[serde(default)]
    pub levels: Vec<LevelTag>,
    pub intensity: String,
    pub spots_total: i64,
    pub spots_available: i64,
    pub description: String,
    pub registration_link: String,
    pub color: String,
    #[serde(default)]
    pub attachments: Vec<SessionAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingSession {
    /// Length in whole minutes, never negative
    pub fn duration_minutes(&self) -> i64 {
        duration_minutes(self.start_time, self.end_time)
    }

    /// Whether registration is still open
    pub fn is_open(&self) -> bool {
        self.spots_available > 0
    }
}

/// Whole minutes from `start` to `end`, clamped at zero
pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Downloadable material attached to a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAttachment {
    pub id: i64,
    pub title: String,
    /// Stored media path
    pub file: String,
}

/// Date range applied to schedule queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    /// Build the window from raw `start`/`end` query values.
    ///
    /// With neither value present only sessions from `today` on are shown.
    /// A present but unparseable value adds no bound of its own and still
    /// suppresses the `today` default.
    pub fn from_params(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Self {
        let start = start.filter(|s| !s.is_empty());
        let end = end.filter(|s| !s.is_empty());

        if start.is_none() && end.is_none() {
            return Self {
                from: Some(today),
                to: None,
            };
        }

        Self {
            from: start.and_then(parse_date),
            to: end.and_then(parse_date),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Filter for schedule listings
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub session_type: Option<TrainingType>,
    pub direction_id: Option<i64>,
    pub coach_id: Option<i64>,
    pub location_id: Option<i64>,
    pub level: Option<Level>,
    pub window: DateWindow,
}

/// Filter for coach listings
#[derive(Debug, Clone, Default)]
pub struct CoachFilter {
    pub featured: Option<bool>,
    pub direction_id: Option<i64>,
}

/// Filter for plan and tariff listings
#[derive(Debug, Clone, Default)]
pub struct PriceListFilter {
    pub category: Option<PlanCategory>,
    pub featured: Option<bool>,
}

fn default_buy_label() -> String {
    "Приобрести".to_string()
}

fn default_color() -> String {
    "#006CFF".to_string()
}

fn deserialize_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw).ok_or_else(|| de::Error::custom(format!("Invalid time: {}", raw)))
}

/// Parse `HH:MM:SS` or `HH:MM`
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoachInput {
    pub full_name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub achievements: String,
    #[serde(default)]
    pub experience_years: i64,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub telegram: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub direction_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanInput {
    pub title: String,
    #[serde(deserialize_with = "deserialize_category", default)]
    pub category: Option<PlanCategory>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub buy_link: String,
    #[serde(default = "default_buy_label")]
    pub buy_label: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub benefits: Vec<BenefitInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenefitInput {
    pub text: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TariffInput {
    pub title: String,
    #[serde(deserialize_with = "deserialize_category", default)]
    pub category: Option<PlanCategory>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub prices: Vec<TariffPriceInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TariffPriceInput {
    pub label: String,
    pub price: Money,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionInput {
    #[serde(default)]
    pub title: String,
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "deserialize_time")]
    pub end_time: NaiveTime,
    #[serde(rename = "type", default)]
    pub session_type: TrainingType,
    pub direction_id: i64,
    #[serde(default)]
    pub coach_id: Option<i64>,
    pub location_id: i64,
    #[serde(default)]
    pub level_ids: Vec<i64>,
    #[serde(default)]
    pub intensity: String,
    #[serde(default)]
    pub spots_total: i64,
    #[serde(default)]
    pub spots_available: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub registration_link: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentInput {
    #[serde(default)]
    pub title: String,
    pub file: String,
}
