//! Article tag repository

use crate::db::DynDatabasePool;
use crate::models::ArticleTag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::{missing_ids, slug_taken};

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All tags ordered by title
    async fn list(&self) -> Result<Vec<ArticleTag>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ArticleTag>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleTag>>;

    /// Check if a title is used by another tag
    async fn title_taken(&self, title: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn create(&self, title: &str, slug: &str) -> Result<ArticleTag>;

    async fn update(&self, id: i64, title: &str, slug: &str) -> Result<Option<ArticleTag>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Ids from `ids` that match no tag
    async fn missing(&self, ids: &[i64]) -> Result<Vec<i64>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn list(&self) -> Result<Vec<ArticleTag>> {
        let rows = sqlx::query("SELECT id, title, slug FROM article_tags ORDER BY title, id")
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list tags")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ArticleTag>> {
        let row = sqlx::query("SELECT id, title, slug FROM article_tags WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get tag by ID")?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleTag>> {
        let row = sqlx::query("SELECT id, title, slug FROM article_tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get tag by slug")?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn title_taken(&self, title: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM article_tags WHERE title = ? AND id != ?")
                .bind(title)
                .bind(exclude_id.unwrap_or(0))
                .fetch_one(self.pool.sqlite())
                .await
                .context("Failed to check tag title")?;

        Ok(count > 0)
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        slug_taken(self.pool.sqlite(), "article_tags", slug, exclude_id).await
    }

    async fn create(&self, title: &str, slug: &str) -> Result<ArticleTag> {
        let result = sqlx::query("INSERT INTO article_tags (title, slug) VALUES (?, ?)")
            .bind(title)
            .bind(slug)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to create tag")?;

        Ok(ArticleTag {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            slug: slug.to_string(),
        })
    }

    async fn update(&self, id: i64, title: &str, slug: &str) -> Result<Option<ArticleTag>> {
        let result = sqlx::query("UPDATE article_tags SET title = ?, slug = ? WHERE id = ?")
            .bind(title)
            .bind(slug)
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update tag")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(ArticleTag {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM article_tags WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete tag")?;

        Ok(result.rows_affected() > 0)
    }

    async fn missing(&self, ids: &[i64]) -> Result<Vec<i64>> {
        missing_ids(self.pool.sqlite(), "article_tags", ids).await
    }
}

pub(crate) fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<ArticleTag> {
    Ok(ArticleTag {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxTagRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxTagRepository::new(pool)
    }

    #[tokio::test]
    async fn test_tag_crud() {
        let repo = setup_test_repo().await;

        let run = repo.create("Бег", "бег").await.unwrap();
        repo.create("Anatomy", "anatomy").await.unwrap();

        let tags = repo.list().await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].title, "Anatomy");

        assert_eq!(repo.get_by_slug("бег").await.unwrap().unwrap().id, run.id);
        assert!(repo.title_taken("Бег", None).await.unwrap());
        assert!(!repo.title_taken("Бег", Some(run.id)).await.unwrap());

        let updated = repo.update(run.id, "Трейл", "трейл").await.unwrap().unwrap();
        assert_eq!(updated.slug, "трейл");
        assert!(repo.update(999, "x", "x").await.unwrap().is_none());

        assert_eq!(repo.missing(&[run.id, 404]).await.unwrap(), vec![404]);
        assert!(repo.delete(run.id).await.unwrap());
        assert!(repo.get_by_id(run.id).await.unwrap().is_none());
    }
}
