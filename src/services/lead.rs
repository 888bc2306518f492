//! Lead service
//!
//! Accepts contact requests from the public form, stores them and relays a
//! notification in the background. Delivery problems never reach the visitor.

use crate::db::repositories::LeadRepository;
use crate::models::{LeadInput, LeadRequest, ListParams, PagedResult};
use crate::services::notify::{lead_message, Notifier};
use crate::services::rate_limiter::RateLimiter;
use crate::services::validation::{FieldErrors, NON_FIELD};
use anyhow::Context;
use std::sync::Arc;

pub const CONTACT_REQUIRED: &str = "Укажите телефон или email для обратной связи";

#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error("Lead not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Too many submissions from one client
    #[error("Too many requests")]
    RateLimited,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct LeadService {
    repo: Arc<dyn LeadRepository>,
    notifier: Option<Arc<dyn Notifier>>,
    limiter: RateLimiter,
}

impl LeadService {
    pub fn new(repo: Arc<dyn LeadRepository>, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self {
            repo,
            notifier,
            limiter: RateLimiter::for_leads(),
        }
    }

    /// Replace the default submission limiter
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Validate and store a lead submitted by `client`, then notify in the
    /// background.
    pub async fn submit(
        &self,
        client: &str,
        input: LeadInput,
    ) -> Result<LeadRequest, LeadServiceError> {
        if !self.limiter.try_acquire(client).await {
            tracing::info!(client, "Lead submission rate limited");
            return Err(LeadServiceError::RateLimited);
        }

        let input = normalize(input);
        validate(&input).map_err(LeadServiceError::ValidationError)?;

        let lead = self
            .repo
            .create(&input)
            .await
            .context("Failed to store lead")?;
        tracing::info!(lead_id = lead.id, "Lead stored");

        if let Some(notifier) = self.notifier.clone() {
            let text = lead_message(&lead);
            let lead_id = lead.id;
            tokio::spawn(async move {
                relay(notifier.as_ref(), lead_id, &text).await;
            });
        }

        Ok(lead)
    }

    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<LeadRequest>, LeadServiceError> {
        let (items, total) = self.repo.list(params).await.context("Failed to list leads")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> Result<LeadRequest, LeadServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get lead")?
            .ok_or_else(|| LeadServiceError::NotFound(format!("Lead with ID {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> Result<(), LeadServiceError> {
        if !self.repo.delete(id).await.context("Failed to delete lead")? {
            return Err(LeadServiceError::NotFound(format!("Lead with ID {} not found", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, LeadServiceError> {
        Ok(self.repo.count().await?)
    }
}

/// Send one notification, logging and swallowing the failure
pub async fn relay(notifier: &dyn Notifier, lead_id: i64, text: &str) {
    match notifier.send(text).await {
        Ok(()) => tracing::debug!(lead_id, "Lead notification delivered"),
        Err(e) => tracing::warn!(lead_id, error = %e, "Telegram notification failed"),
    }
}

fn normalize(input: LeadInput) -> LeadInput {
    LeadInput {
        full_name: input.full_name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone.trim().to_string(),
        preferred_direction: input.preferred_direction.trim().to_string(),
        message: input.message.trim().to_string(),
        source: input.source.trim().to_string(),
    }
}

fn validate(input: &LeadInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.require("full_name", &input.full_name);
    errors.max_chars("full_name", &input.full_name, 120);
    errors.max_chars("email", &input.email, 254);
    errors.email("email", &input.email);
    errors.max_chars("phone", &input.phone, 30);
    errors.max_chars("preferred_direction", &input.preferred_direction, 120);
    errors.max_chars("source", &input.source, 60);

    if input.email.is_empty() && input.phone.is_empty() {
        errors.add(NON_FIELD, CONTACT_REQUIRED);
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxLeadRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::notify::NotifyError;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct ChannelNotifier {
        tx: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            let _ = self.tx.send(text.to_string());
            Ok(())
        }
    }

    async fn setup(notifier: Option<Arc<dyn Notifier>>) -> LeadService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        LeadService::new(SqlxLeadRepository::boxed(pool), notifier)
    }

    fn input(name: &str, email: &str, phone: &str) -> LeadInput {
        LeadInput {
            full_name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_requires_phone_or_email() {
        let service = setup(None).await;
        match service.submit("ip", input("Анна", "", "  ")).await {
            Err(LeadServiceError::ValidationError(errors)) => {
                assert_eq!(errors.get(NON_FIELD).unwrap(), &[CONTACT_REQUIRED.to_string()]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_field_errors() {
        let service = setup(None).await;
        let long_phone = "9".repeat(31);
        match service.submit("ip", input("", "bad@", &long_phone)).await {
            Err(LeadServiceError::ValidationError(errors)) => {
                assert!(errors.get("full_name").is_some());
                assert!(errors.get("email").is_some());
                assert!(errors.get("phone").is_some());
                assert!(errors.get(NON_FIELD).is_none());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stores_trimmed_and_notifies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = setup(Some(Arc::new(ChannelNotifier { tx }))).await;

        let lead = service
            .submit("ip", input("  Анна ", "", "+7 900 000-00-00"))
            .await
            .unwrap();
        assert_eq!(lead.full_name, "Анна");

        let text = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(text.contains("Анна"));
        assert!(text.contains("+7 900 000-00-00"));
    }

    #[tokio::test]
    async fn test_rate_limited_per_client() {
        let service = setup(None).await;
        for _ in 0..5 {
            service
                .submit("10.0.0.1", input("Анна", "anna@gabi.club", ""))
                .await
                .unwrap();
        }
        assert!(matches!(
            service
                .submit("10.0.0.1", input("Анна", "anna@gabi.club", ""))
                .await,
            Err(LeadServiceError::RateLimited)
        ));
        assert!(service
            .submit("10.0.0.2", input("Анна", "anna@gabi.club", ""))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_admin_listing() {
        let service = setup(None).await;
        for name in ["Первый", "Второй"] {
            service.submit(name, input(name, "", "123")).await.unwrap();
        }

        let page = service.list(&ListParams::new(1, 1)).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].full_name, "Второй");

        let id = page.items[0].id;
        assert_eq!(service.get(id).await.unwrap().id, id);
        service.delete(id).await.unwrap();
        assert!(matches!(
            service.get(id).await,
            Err(LeadServiceError::NotFound(_))
        ));
    }
}
