//! Data models
//!
//! This module contains the data structures shared across the Gabi backend:
//! - Database entities (Article, Camp, Coach, TrainingSession, ContactInfo, ...)
//! - Listing filters
//! - Admin input types
//! - `Money` and pagination helpers

mod blog;
mod camp;
mod common;
mod money;
mod session;
mod site;
mod training;
mod user;

pub use blog::{
    split_search_terms, Article, ArticleFilter, ArticleGalleryImage, ArticleInput, ArticleSection,
    ArticleSectionInput, ArticleSort, ArticleSortField, ArticleTag, GalleryImageInput, TagInput,
};
pub use camp::{
    Camp, CampDay, CampDayInput, CampFilter, CampGalleryImage, CampHighlight, CampInclusion,
    CampInput, CampStatus, TextItemInput,
};
pub use common::{ListParams, PagedResult};
pub use money::{Money, MoneyError};
pub use session::Session;
pub use site::{
    ClubInput, ClubProfile, ContactInfo, ContactInput, HeroSlide, HeroSlideInput, LeadInput,
    LeadRequest, SocialLink, SocialLinkInput,
};
pub use training::{
    category_label, category_str, duration_minutes, parse_category, parse_date, parse_time,
    AttachmentInput, BenefitInput, Coach, CoachFilter, CoachInput, DateWindow, DirectionInput,
    Level, LevelTag, Location, LocationInput, PlanBenefit, PlanCategory, PlanInput,
    PriceListFilter, SessionAttachment, SessionFilter, SessionInput, SessionTariff, TariffInput,
    TariffPrice, TariffPriceInput, TrainingDirection, TrainingPlan, TrainingSession, TrainingType,
};
pub use user::{CreateUserInput, User, UserRole};
