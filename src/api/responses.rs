//! Public response shapes
//!
//! The public endpoints render stored media paths as URLs and add the derived
//! display fields (`status_display`, `category_display`, level `name`,
//! session `duration` and `is_open`). Admin endpoints return the models as
//! stored instead.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::config::MediaConfig;
use crate::models::{
    category_label, category_str, Article, ArticleSection, ArticleTag, Camp, CampDay,
    CampHighlight, CampInclusion, CampStatus, ClubProfile, Coach, ContactInfo, LevelTag, Location,
    Money, PlanBenefit, SessionTariff, SocialLink, TariffPrice, TrainingDirection, TrainingPlan,
    TrainingSession, TrainingType, User,
};

fn time_str(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

// ============================================================================
// Blog
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ArticleListItem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub header_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub is_featured: bool,
    pub reading_time: i64,
    pub tags: Vec<ArticleTag>,
}

impl ArticleListItem {
    pub fn new(article: &Article, media: &MediaConfig) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            slug: article.slug.clone(),
            excerpt: article.excerpt.clone(),
            cover_image: media.url_for(&article.cover_image),
            header_image: media.url_for(&article.header_image),
            published_at: article.published_at,
            is_featured: article.is_featured,
            reading_time: article.reading_time,
            tags: article.tags.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GalleryImageResponse {
    pub id: i64,
    pub image: Option<String>,
    pub caption: String,
    pub order: i64,
}

#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub summary: ArticleListItem,
    pub content: String,
    pub gallery: Vec<GalleryImageResponse>,
    pub sections: Vec<ArticleSection>,
    pub updated_at: DateTime<Utc>,
    pub seo_title: String,
    pub seo_description: String,
    pub is_published: bool,
}

impl ArticleDetail {
    pub fn new(article: Article, media: &MediaConfig) -> Self {
        let summary = ArticleListItem::new(&article, media);
        let gallery = article
            .gallery
            .into_iter()
            .map(|image| GalleryImageResponse {
                id: image.id,
                image: media.url_for(&image.image),
                caption: image.caption,
                order: image.order,
            })
            .collect();

        Self {
            summary,
            content: article.content,
            gallery,
            sections: article.sections,
            updated_at: article.updated_at,
            seo_title: article.seo_title,
            seo_description: article.seo_description,
            is_published: article.is_published,
        }
    }
}

// ============================================================================
// Camps
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CampListItem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_from: Money,
    pub location: String,
    pub hero_image: Option<String>,
    pub status: CampStatus,
    pub status_display: &'static str,
    pub is_featured: bool,
}

impl CampListItem {
    pub fn new(camp: &Camp, media: &MediaConfig) -> Self {
        Self {
            id: camp.id,
            title: camp.title.clone(),
            slug: camp.slug.clone(),
            summary: camp.summary.clone(),
            start_date: camp.start_date,
            end_date: camp.end_date,
            price_from: camp.price_from,
            location: camp.location.clone(),
            hero_image: media.url_for(&camp.hero_image),
            status: camp.status,
            status_display: camp.status.label(),
            is_featured: camp.is_featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CampDetail {
    #[serde(flatten)]
    pub summary: CampListItem,
    pub description: String,
    pub registration_link: String,
    pub header_image: Option<String>,
    pub logistics: String,
    pub target_audience: String,
    pub highlights: Vec<CampHighlight>,
    pub program: Vec<CampDay>,
    pub gallery: Vec<GalleryImageResponse>,
    pub inclusions: Vec<CampInclusion>,
    pub trainers: Vec<CoachResponse>,
}

impl CampDetail {
    pub fn new(camp: Camp, media: &MediaConfig) -> Self {
        let summary = CampListItem::new(&camp, media);
        let gallery = camp
            .gallery
            .into_iter()
            .map(|image| GalleryImageResponse {
                id: image.id,
                image: media.url_for(&image.image),
                caption: image.caption,
                order: image.order,
            })
            .collect();

        Self {
            summary,
            description: camp.description,
            registration_link: camp.registration_link,
            header_image: media.url_for(&camp.header_image),
            logistics: camp.logistics,
            target_audience: camp.target_audience,
            highlights: camp.highlights,
            program: camp.program,
            gallery,
            inclusions: camp.inclusions,
            trainers: camp
                .trainers
                .into_iter()
                .map(|coach| CoachResponse::new(coach, media))
                .collect(),
        }
    }
}

// ============================================================================
// Trainings
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CoachResponse {
    pub id: i64,
    pub full_name: String,
    pub slug: String,
    pub role: String,
    pub bio: String,
    pub achievements: String,
    pub experience_years: i64,
    pub photo: Option<String>,
    pub instagram: String,
    pub telegram: String,
    pub phone: String,
    pub email: String,
    pub is_featured: bool,
    pub directions: Vec<TrainingDirection>,
}

impl CoachResponse {
    pub fn new(coach: Coach, media: &MediaConfig) -> Self {
        Self {
            id: coach.id,
            photo: media.url_for(&coach.photo),
            full_name: coach.full_name,
            slug: coach.slug,
            role: coach.role,
            bio: coach.bio,
            achievements: coach.achievements,
            experience_years: coach.experience_years,
            instagram: coach.instagram,
            telegram: coach.telegram,
            phone: coach.phone,
            email: coach.email,
            is_featured: coach.is_featured,
            directions: coach.directions,
        }
    }
}

/// Level with its display name
#[derive(Debug, Serialize)]
pub struct LevelResponse {
    pub id: i64,
    pub tag: &'static str,
    pub name: &'static str,
}

impl From<&LevelTag> for LevelResponse {
    fn from(level: &LevelTag) -> Self {
        Self {
            id: level.id,
            tag: level.tag.as_str(),
            name: level.tag.label(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: i64,
    pub title: String,
    pub category: &'static str,
    pub category_display: &'static str,
    pub icon: String,
    pub description: String,
    pub price: Money,
    pub period: String,
    pub buy_link: String,
    pub buy_label: String,
    pub is_featured: bool,
    pub order: i64,
    pub benefits: Vec<PlanBenefit>,
}

impl From<TrainingPlan> for PlanResponse {
    fn from(plan: TrainingPlan) -> Self {
        Self {
            id: plan.id,
            title: plan.title,
            category: category_str(plan.category),
            category_display: category_label(plan.category),
            icon: plan.icon,
            description: plan.description,
            price: plan.price,
            period: plan.period,
            buy_link: plan.buy_link,
            buy_label: plan.buy_label,
            is_featured: plan.is_featured,
            order: plan.order,
            benefits: plan.benefits,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TariffResponse {
    pub id: i64,
    pub title: String,
    pub category: &'static str,
    pub category_display: &'static str,
    pub description: String,
    pub is_featured: bool,
    pub order: i64,
    pub prices: Vec<TariffPrice>,
}

impl From<SessionTariff> for TariffResponse {
    fn from(tariff: SessionTariff) -> Self {
        Self {
            id: tariff.id,
            title: tariff.title,
            category: category_str(tariff.category),
            category_display: category_label(tariff.category),
            description: tariff.description,
            is_featured: tariff.is_featured,
            order: tariff.order,
            prices: tariff.prices,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: i64,
    pub title: String,
    pub file: Option<String>,
}

/// Full schedule entry
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub session_type: TrainingType,
    pub direction: TrainingDirection,
    pub coach: Option<CoachResponse>,
    pub location: Location,
    pub levels: Vec<LevelResponse>,
    pub intensity: String,
    pub spots_total: i64,
    pub spots_available: i64,
    pub description: String,
    pub registration_link: String,
    pub color: String,
    pub duration: i64,
    pub is_open: bool,
    pub attachments: Vec<AttachmentResponse>,
}

impl SessionResponse {
    pub fn new(session: TrainingSession, media: &MediaConfig) -> Self {
        Self {
            id: session.id,
            duration: session.duration_minutes(),
            is_open: session.is_open(),
            start_time: time_str(session.start_time),
            end_time: time_str(session.end_time),
            levels: session.levels.iter().map(LevelResponse::from).collect(),
            title: session.title,
            date: session.date,
            session_type: session.session_type,
            direction: session.direction,
            coach: session.coach.map(|coach| CoachResponse::new(coach, media)),
            location: session.location,
            intensity: session.intensity,
            spots_total: session.spots_total,
            spots_available: session.spots_available,
            description: session.description,
            registration_link: session.registration_link,
            color: session.color,
            attachments: session
                .attachments
                .into_iter()
                .map(|attachment| AttachmentResponse {
                    id: attachment.id,
                    title: attachment.title,
                    file: media.url_for(&attachment.file),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IdTitle {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CoachRef {
    pub id: i64,
    pub full_name: String,
    pub slug: String,
}

/// Compact schedule entry for calendar widgets
#[derive(Debug, Serialize)]
pub struct SimpleSessionResponse {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub session_type: TrainingType,
    pub direction: IdTitle,
    pub coach: Option<CoachRef>,
    pub location: IdTitle,
    pub levels: Vec<LevelResponse>,
    pub intensity: String,
    pub spots_total: i64,
    pub spots_available: i64,
    pub description: String,
    pub registration_link: String,
    pub color: String,
    pub duration: i64,
    pub is_open: bool,
}

impl From<TrainingSession> for SimpleSessionResponse {
    fn from(session: TrainingSession) -> Self {
        Self {
            id: session.id,
            duration: session.duration_minutes(),
            is_open: session.is_open(),
            start_time: time_str(session.start_time),
            end_time: time_str(session.end_time),
            levels: session.levels.iter().map(LevelResponse::from).collect(),
            title: session.title,
            date: session.date,
            session_type: session.session_type,
            direction: IdTitle {
                id: session.direction.id,
                title: session.direction.title,
            },
            coach: session.coach.map(|coach| CoachRef {
                id: coach.id,
                full_name: coach.full_name,
                slug: coach.slug,
            }),
            location: IdTitle {
                id: session.location.id,
                title: session.location.title,
            },
            intensity: session.intensity,
            spots_total: session.spots_total,
            spots_available: session.spots_available,
            description: session.description,
            registration_link: session.registration_link,
            color: session.color,
        }
    }
}

/// Filter widget data
#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub directions: Vec<TrainingDirection>,
    pub coaches: Vec<CoachResponse>,
    pub locations: Vec<Location>,
    pub levels: Vec<LevelResponse>,
}

// ============================================================================
// Core
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ContactResponse {
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
    pub social_links: Vec<SocialLink>,
}

impl From<ContactInfo> for ContactResponse {
    fn from(contact: ContactInfo) -> Self {
        Self {
            id: contact.id,
            title: contact.title,
            phone_primary: contact.phone_primary,
            phone_secondary: contact.phone_secondary,
            email: contact.email,
            address: contact.address,
            map_url: contact.map_url,
            working_hours: contact.working_hours,
            whatsapp: contact.whatsapp,
            telegram: contact.telegram,
            instagram: contact.instagram,
            youtube: contact.youtube,
            vk: contact.vk,
            social_links: contact.social_links,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HeroSlideResponse {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub image: Option<String>,
    pub order: i64,
}

#[derive(Debug, Serialize)]
pub struct ClubResponse {
    pub id: i64,
    pub name: String,
    pub tagline: String,
    pub mission: String,
    pub story: String,
    pub founded_year: Option<i64>,
    pub hero_video: Option<String>,
    pub hero_description: String,
    pub seo_title: String,
    pub seo_description: String,
    pub hero_slides: Vec<HeroSlideResponse>,
}

impl ClubResponse {
    pub fn new(club: ClubProfile, media: &MediaConfig) -> Self {
        Self {
            id: club.id,
            hero_video: media.url_for(&club.hero_video),
            name: club.name,
            tagline: club.tagline,
            mission: club.mission,
            story: club.story,
            founded_year: club.founded_year,
            hero_description: club.hero_description,
            seo_title: club.seo_title,
            seo_description: club.seo_description,
            hero_slides: club
                .hero_slides
                .into_iter()
                .map(|slide| HeroSlideResponse {
                    id: slide.id,
                    image: media.url_for(&slide.image),
                    title: slide.title,
                    subtitle: slide.subtitle,
                    order: slide.order,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}
