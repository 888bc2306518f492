//! Services layer - Business logic
//!
//! This module contains the business logic of the Gabi backend.
//! Services are responsible for:
//! - Validating admin and visitor input
//! - Generating unique slugs
//! - Coordinating repositories and the lead notifier

pub mod blog;
pub mod camp;
pub mod lead;
pub mod notify;
pub mod password;
pub mod rate_limiter;
pub mod site;
pub mod slug;
pub mod training;
pub mod user;
pub mod validation;

pub use blog::{BlogService, BlogServiceError};
pub use camp::{CampService, CampServiceError};
pub use lead::{LeadService, LeadServiceError};
pub use notify::{Notifier, NotifyError, TelegramNotifier};
pub use password::{hash_password, verify_password};
pub use rate_limiter::{LoginRateLimiter, RateLimiter};
pub use site::{SiteService, SiteServiceError};
pub use training::{TrainingMeta, TrainingService, TrainingServiceError};
pub use user::{LoginInput, UserService, UserServiceError};
pub use validation::FieldErrors;
