//! Lead repository

use crate::db::DynDatabasePool;
use crate::models::{LeadInput, LeadRequest, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::count_rows;

const LEAD_COLUMNS: &str =
    "id, full_name, email, phone, preferred_direction, message, source, created_at";

/// Lead repository trait
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create(&self, input: &LeadInput) -> Result<LeadRequest>;

    /// Page of leads, newest first, with the total count
    async fn list(&self, params: &ListParams) -> Result<(Vec<LeadRequest>, i64)>;

    async fn get_by_id(&self, id: i64) -> Result<Option<LeadRequest>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based lead repository implementation
pub struct SqlxLeadRepository {
    pool: DynDatabasePool,
}

impl SqlxLeadRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LeadRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }
}

#[async_trait]
impl LeadRepository for SqlxLeadRepository {
    async fn create(&self, input: &LeadInput) -> Result<LeadRequest> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO lead_requests (full_name, email, phone, preferred_direction, message,
                source, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.preferred_direction)
        .bind(&input.message)
        .bind(&input.source)
        .bind(now)
        .execute(self.db())
        .await
        .context("Failed to create lead request")?;

        Ok(LeadRequest {
            id: result.last_insert_rowid(),
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            preferred_direction: input.preferred_direction.clone(),
            message: input.message.clone(),
            source: input.source.clone(),
            created_at: now,
        })
    }

    async fn list(&self, params: &ListParams) -> Result<(Vec<LeadRequest>, i64)> {
        let total = self.count().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM lead_requests ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            LEAD_COLUMNS
        ))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db())
        .await
        .context("Failed to list lead requests")?;

        let leads = rows.iter().map(row_to_lead).collect::<Result<Vec<_>>>()?;
        Ok((leads, total))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<LeadRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM lead_requests WHERE id = ?",
            LEAD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db())
        .await
        .context("Failed to get lead request")?;

        row.as_ref().map(row_to_lead).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lead_requests WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete lead request")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        count_rows(self.db(), "lead_requests").await
    }
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<LeadRequest> {
    Ok(LeadRequest {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        preferred_direction: row.try_get("preferred_direction")?,
        message: row.try_get("message")?,
        source: row.try_get("source")?,
        created_at: row.try_get("created_at")?,
    })
}
