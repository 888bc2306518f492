//! Blog service
//!
//! Articles and tags. Public reads only ever see published articles; the
//! admin side works on everything.

use crate::db::repositories::{ArticleRepository, TagRepository};
use crate::models::{Article, ArticleFilter, ArticleInput, ArticleTag, TagInput};
use crate::services::slug::{explicit_slug, unique_slug};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use std::sync::Arc;

const ARTICLE_SLUG_MAX: usize = 240;
const TAG_SLUG_MAX: usize = 80;

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Slug or title already used by another record
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct BlogService {
    articles: Arc<dyn ArticleRepository>,
    tags: Arc<dyn TagRepository>,
}

impl BlogService {
    pub fn new(articles: Arc<dyn ArticleRepository>, tags: Arc<dyn TagRepository>) -> Self {
        Self { articles, tags }
    }

    /// Articles matching `filter`
    ///
    /// Callers decide visibility through `filter.include_unpublished`.
    pub async fn list_articles(
        &self,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, BlogServiceError> {
        Ok(self
            .articles
            .list(filter)
            .await
            .context("Failed to list articles")?)
    }

    /// Published article by slug
    pub async fn get_published(&self, slug: &str) -> Result<Article, BlogServiceError> {
        self.articles
            .get_by_slug(slug, false)
            .await
            .context("Failed to get article")?
            .ok_or_else(|| BlogServiceError::NotFound(format!("Article '{}' not found", slug)))
    }

    pub async fn get_article(&self, id: i64) -> Result<Article, BlogServiceError> {
        self.articles
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or_else(|| article_not_found(id))
    }

    pub async fn create_article(&self, input: &ArticleInput) -> Result<Article, BlogServiceError> {
        self.validate_article(input).await?;
        let slug = self.article_slug(input, None, None).await?;

        let article = self
            .articles
            .create(&slug, input)
            .await
            .context("Failed to create article")?;
        tracing::info!(article_id = article.id, slug = %article.slug, "Article created");
        Ok(article)
    }

    pub async fn update_article(
        &self,
        id: i64,
        input: &ArticleInput,
    ) -> Result<Article, BlogServiceError> {
        let current = self.get_article(id).await?;
        self.validate_article(input).await?;
        let slug = self.article_slug(input, Some(id), Some(current.slug)).await?;

        self.articles
            .update(id, &slug, input)
            .await
            .context("Failed to update article")?
            .ok_or_else(|| article_not_found(id))
    }

    pub async fn delete_article(&self, id: i64) -> Result<(), BlogServiceError> {
        if !self
            .articles
            .delete(id)
            .await
            .context("Failed to delete article")?
        {
            return Err(article_not_found(id));
        }
        tracing::info!(article_id = id, "Article deleted");
        Ok(())
    }

    pub async fn count_articles(&self) -> Result<i64, BlogServiceError> {
        Ok(self.articles.count().await?)
    }

    pub async fn list_tags(&self) -> Result<Vec<ArticleTag>, BlogServiceError> {
        Ok(self.tags.list().await.context("Failed to list tags")?)
    }

    pub async fn get_tag_by_slug(&self, slug: &str) -> Result<ArticleTag, BlogServiceError> {
        self.tags
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| BlogServiceError::NotFound(format!("Tag '{}' not found", slug)))
    }

    pub async fn get_tag(&self, id: i64) -> Result<ArticleTag, BlogServiceError> {
        self.tags
            .get_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| tag_not_found(id))
    }

    pub async fn create_tag(&self, input: &TagInput) -> Result<ArticleTag, BlogServiceError> {
        let title = self.validate_tag(input, None).await?;
        let slug = self.tag_slug(input, None, None).await?;

        Ok(self
            .tags
            .create(&title, &slug)
            .await
            .context("Failed to create tag")?)
    }

    pub async fn update_tag(&self, id: i64, input: &TagInput) -> Result<ArticleTag, BlogServiceError> {
        let current = self.get_tag(id).await?;
        let title = self.validate_tag(input, Some(id)).await?;
        let slug = self.tag_slug(input, Some(id), Some(current.slug)).await?;

        self.tags
            .update(id, &title, &slug)
            .await
            .context("Failed to update tag")?
            .ok_or_else(|| tag_not_found(id))
    }

    pub async fn delete_tag(&self, id: i64) -> Result<(), BlogServiceError> {
        if !self.tags.delete(id).await.context("Failed to delete tag")? {
            return Err(tag_not_found(id));
        }
        Ok(())
    }

    async fn validate_article(&self, input: &ArticleInput) -> Result<(), BlogServiceError> {
        let mut errors = FieldErrors::new();

        errors.require("title", &input.title);
        errors.max_chars("title", &input.title, 200);
        errors.max_chars("seo_title", &input.seo_title, 200);
        if input.reading_time < 0 {
            errors.add("reading_time", "Значение должно быть неотрицательным.");
        }
        for (i, section) in input.sections.iter().enumerate() {
            errors.max_chars(&format!("sections[{}].title", i), &section.title, 160);
        }
        for (i, image) in input.gallery.iter().enumerate() {
            errors.require(&format!("gallery[{}].image", i), &image.image);
            errors.max_chars(&format!("gallery[{}].caption", i), &image.caption, 200);
        }

        let missing = self
            .tags
            .missing(&input.tag_ids)
            .await
            .context("Failed to check tags")?;
        for id in missing {
            errors.add("tag_ids", format!("Тег с id {} не найден.", id));
        }

        errors.into_result().map_err(BlogServiceError::ValidationError)
    }

    /// Trimmed title, checked for blanks, length and uniqueness
    async fn validate_tag(
        &self,
        input: &TagInput,
        exclude_id: Option<i64>,
    ) -> Result<String, BlogServiceError> {
        let title = input.title.trim();
        let mut errors = FieldErrors::new();
        errors.require("title", title);
        errors.max_chars("title", title, 60);
        errors.into_result().map_err(BlogServiceError::ValidationError)?;

        if self
            .tags
            .title_taken(title, exclude_id)
            .await
            .context("Failed to check tag title")?
        {
            return Err(BlogServiceError::Conflict(format!(
                "Tag '{}' already exists",
                title
            )));
        }
        Ok(title.to_string())
    }

    /// Explicit slugs must be free; blank ones keep `current` or are generated.
    async fn article_slug(
        &self,
        input: &ArticleInput,
        exclude_id: Option<i64>,
        current: Option<String>,
    ) -> Result<String, BlogServiceError> {
        if let Some(slug) = explicit_slug(input.slug.as_deref(), ARTICLE_SLUG_MAX) {
            if self.articles.slug_taken(&slug, exclude_id).await? {
                return Err(BlogServiceError::Conflict(format!(
                    "Article slug '{}' is already taken",
                    slug
                )));
            }
            return Ok(slug);
        }
        if let Some(current) = current {
            return Ok(current);
        }

        let articles = self.articles.clone();
        Ok(
            unique_slug(&input.title, "article", ARTICLE_SLUG_MAX, move |candidate| {
                let articles = articles.clone();
                async move { articles.slug_taken(&candidate, exclude_id).await }
            })
            .await?,
        )
    }

    async fn tag_slug(
        &self,
        input: &TagInput,
        exclude_id: Option<i64>,
        current: Option<String>,
    ) -> Result<String, BlogServiceError> {
        if let Some(slug) = explicit_slug(input.slug.as_deref(), TAG_SLUG_MAX) {
            if self.tags.slug_taken(&slug, exclude_id).await? {
                return Err(BlogServiceError::Conflict(format!(
                    "Tag slug '{}' is already taken",
                    slug
                )));
            }
            return Ok(slug);
        }
        if let Some(current) = current {
            return Ok(current);
        }

        let tags = self.tags.clone();
        Ok(
            unique_slug(&input.title, "tag", TAG_SLUG_MAX, move |candidate| {
                let tags = tags.clone();
                async move { tags.slug_taken(&candidate, exclude_id).await }
            })
            .await?,
        )
    }
}

fn article_not_found(id: i64) -> BlogServiceError {
    BlogServiceError::NotFound(format!("Article with ID {} not found", id))
}

fn tag_not_found(id: i64) -> BlogServiceError {
    BlogServiceError::NotFound(format!("Tag with ID {} not found", id))
}
