//! User service
//!
//! Staff accounts and login sessions for the admin interface:
//! - login by username or email, logout, session validation
//! - user management (admin only, enforced by the API layer)
//! - bootstrap of the first admin from configuration

use crate::config::AdminConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, User, UserRole};
use crate::services::password::{hash_password, is_acceptable, verify_password, MIN_PASSWORD_LEN};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Username or email already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    NotFound(String),

    /// Refused operation, such as deleting yourself
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Login request body
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

/// User service for staff accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Check credentials and open a session.
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub async fn login(&self, input: &LoginInput) -> Result<(User, Session), UserServiceError> {
        let user = self
            .find_user_by_username_or_email(input.username_or_email.trim())
            .await?
            .ok_or_else(invalid_credentials)?;

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(invalid_credentials());
        }

        let session = self.create_session(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, session))
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// User behind a session token, `None` when unknown or expired
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::debug!("Failed to drop expired session: {}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.user_repo.list().await.context("Failed to list users")?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    /// Create a staff account
    pub async fn create_user(&self, input: &CreateUserInput) -> Result<User, UserServiceError> {
        let username = input.username.trim();
        let email = input.email.trim();

        let mut errors = FieldErrors::new();
        errors.require("username", username);
        errors.max_chars("username", username, 50);
        errors.require("email", email);
        errors.email("email", email);
        if !is_acceptable(&input.password) {
            errors.add(
                "password",
                format!("Пароль должен содержать не менее {} символов.", MIN_PASSWORD_LEN),
            );
        }
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        if self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let hash = hash_password(&input.password)?;
        let user = User::new(
            username.to_string(),
            email.to_string(),
            hash,
            input.role.unwrap_or_default(),
        );
        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }

    /// Delete a staff account; `actor_id` may not delete itself
    pub async fn delete_user(&self, actor_id: i64, id: i64) -> Result<(), UserServiceError> {
        if actor_id == id {
            return Err(UserServiceError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }

        let deleted = self
            .user_repo
            .delete(id)
            .await
            .context("Failed to delete user")?;
        if !deleted {
            return Err(UserServiceError::NotFound(format!("User with ID {} not found", id)));
        }
        Ok(())
    }

    /// Create the configured admin when no user exists yet.
    ///
    /// Returns the created user, or `None` when users already exist or the
    /// configuration leaves the admin password empty.
    pub async fn bootstrap_admin(
        &self,
        config: &AdminConfig,
    ) -> Result<Option<User>, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;
        if count > 0 {
            return Ok(None);
        }
        if config.password.is_empty() {
            tracing::warn!("No users exist and no admin password is configured");
            return Ok(None);
        }

        let input = CreateUserInput {
            username: config.username.clone(),
            email: config.email.clone(),
            password: config.password.clone(),
            role: Some(UserRole::Admin),
        };
        self.create_user(&input).await.map(Some)
    }

    /// Delete expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        Ok(self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }
}

fn invalid_credentials() -> UserServiceError {
    UserServiceError::AuthenticationError("Invalid username or password".to_string())
}
