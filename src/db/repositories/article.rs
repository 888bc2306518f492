//! Article repository
//!
//! Database operations for blog articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait on SQLite
//!
//! Tags are loaded for every article in one extra query per call; sections
//! and the gallery only for single-article lookups.

use crate::db::DynDatabasePool;
use crate::models::{
    Article, ArticleFilter, ArticleGalleryImage, ArticleInput, ArticleSection, ArticleSort,
    ArticleTag,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::tag::row_to_tag;
use super::{count_rows, push_id_list, slug_taken};

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// List articles matching the filter, with tags
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>>;

    /// Get a complete article by slug
    async fn get_by_slug(&self, slug: &str, include_unpublished: bool) -> Result<Option<Article>>;

    /// Get a complete article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Create an article with its tags, sections and gallery
    async fn create(&self, slug: &str, input: &ArticleInput) -> Result<Article>;

    /// Replace an article and its child collections
    async fn update(&self, id: i64, slug: &str, input: &ArticleInput) -> Result<Option<Article>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }
}

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.slug, a.excerpt, a.content, a.cover_image, \
     a.header_image, a.published_at, a.updated_at, a.is_published, a.is_featured, \
     a.seo_title, a.seo_description, a.reading_time";

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM articles a WHERE 1 = 1", ARTICLE_COLUMNS));

        if !filter.include_unpublished {
            qb.push(" AND a.is_published = 1");
        }
        if let Some(slug) = &filter.tag_slug {
            qb.push(
                " AND EXISTS (SELECT 1 FROM article_tag_links l \
                 JOIN article_tags t ON t.id = l.tag_id \
                 WHERE l.article_id = a.id AND t.slug = ",
            )
            .push_bind(slug.clone())
            .push(")");
        }
        if let Some(tag_id) = filter.tag_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM article_tag_links l \
                 WHERE l.article_id = a.id AND l.tag_id = ",
            )
            .push_bind(tag_id)
            .push(")");
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND a.is_featured = ").push_bind(featured);
        }

        qb.push(" ORDER BY ");
        let ordering = if filter.ordering.is_empty() {
            vec![ArticleSort::DEFAULT]
        } else {
            filter.ordering.clone()
        };
        for sort in &ordering {
            qb.push("a.")
                .push(sort.field.column())
                .push(if sort.descending { " DESC, " } else { " ASC, " });
        }
        qb.push("a.id DESC");

        let rows = qb
            .build()
            .fetch_all(self.db())
            .await
            .context("Failed to list articles")?;

        let mut articles = rows.iter().map(row_to_article).collect::<Result<Vec<_>>>()?;

        // SQLite's LIKE only folds ASCII case, so terms are matched here.
        if !filter.search.is_empty() {
            articles.retain(|article| article.matches_terms(&filter.search));
        }

        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        let mut tags = load_tags(self.db(), &ids).await?;
        for article in &mut articles {
            article.tags = tags.remove(&article.id).unwrap_or_default();
        }

        Ok(articles)
    }

    async fn get_by_slug(&self, slug: &str, include_unpublished: bool) -> Result<Option<Article>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM articles a WHERE a.slug = ", ARTICLE_COLUMNS));
        qb.push_bind(slug);
        if !include_unpublished {
            qb.push(" AND a.is_published = 1");
        }

        let row = qb
            .build()
            .fetch_optional(self.db())
            .await
            .context("Failed to get article by slug")?;

        match row {
            Some(row) => Ok(Some(load_children(self.db(), row_to_article(&row)?).await?)),
            None => Ok(None),
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles a WHERE a.id = ?", ARTICLE_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get article by ID")?;

        match row {
            Some(row) => Ok(Some(load_children(self.db(), row_to_article(&row)?).await?)),
            None => Ok(None),
        }
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        slug_taken(self.db(), "articles", slug, exclude_id).await
    }

    async fn create(&self, slug: &str, input: &ArticleInput) -> Result<Article> {
        let now = Utc::now();
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO articles (title, slug, excerpt, content, cover_image, header_image,
                published_at, updated_at, is_published, is_featured, seo_title,
                seo_description, reading_time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(slug)
        .bind(&input.excerpt)
        .bind(&input.content)
        .bind(&input.cover_image)
        .bind(&input.header_image)
        .bind(now)
        .bind(now)
        .bind(input.is_published)
        .bind(input.is_featured)
        .bind(&input.seo_title)
        .bind(&input.seo_description)
        .bind(input.reading_time)
        .execute(&mut *tx)
        .await
        .context("Failed to create article")?;

        let id = result.last_insert_rowid();
        write_children(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Article not found after insert"))
    }

    async fn update(&self, id: i64, slug: &str, input: &ArticleInput) -> Result<Option<Article>> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE articles
            SET title = ?, slug = ?, excerpt = ?, content = ?, cover_image = ?,
                header_image = ?, updated_at = ?, is_published = ?, is_featured = ?,
                seo_title = ?, seo_description = ?, reading_time = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(slug)
        .bind(&input.excerpt)
        .bind(&input.content)
        .bind(&input.cover_image)
        .bind(&input.header_image)
        .bind(Utc::now())
        .bind(input.is_published)
        .bind(input.is_featured)
        .bind(&input.seo_title)
        .bind(&input.seo_description)
        .bind(input.reading_time)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update article")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        for table in ["article_tag_links", "article_sections", "article_gallery_images"] {
            sqlx::query(&format!("DELETE FROM {} WHERE article_id = ?", table))
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear {}", table))?;
        }
        write_children(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete article")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        count_rows(self.db(), "articles").await
    }
}

async fn write_children(conn: &mut SqliteConnection, id: i64, input: &ArticleInput) -> Result<()> {
    for tag_id in &input.tag_ids {
        sqlx::query("INSERT OR IGNORE INTO article_tag_links (article_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(*tag_id)
            .execute(&mut *conn)
            .await
            .context("Failed to link tag")?;
    }

    for section in &input.sections {
        sqlx::query(
            "INSERT INTO article_sections (article_id, title, content, sort_order) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&section.title)
        .bind(&section.content)
        .bind(section.order)
        .execute(&mut *conn)
        .await
        .context("Failed to insert article section")?;
    }

    for image in &input.gallery {
        sqlx::query(
            "INSERT INTO article_gallery_images (article_id, image, caption, sort_order) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&image.image)
        .bind(&image.caption)
        .bind(image.order)
        .execute(&mut *conn)
        .await
        .context("Failed to insert gallery image")?;
    }

    Ok(())
}

async fn load_children(db: &SqlitePool, mut article: Article) -> Result<Article> {
    let mut tags = load_tags(db, &[article.id]).await?;
    article.tags = tags.remove(&article.id).unwrap_or_default();

    let rows = sqlx::query(
        "SELECT id, title, content, sort_order FROM article_sections \
         WHERE article_id = ? ORDER BY sort_order, id",
    )
    .bind(article.id)
    .fetch_all(db)
    .await
    .context("Failed to load article sections")?;
    article.sections = rows
        .iter()
        .map(|row| {
            Ok(ArticleSection {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                content: row.try_get("content")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect::<Result<_>>()?;

    let rows = sqlx::query(
        "SELECT id, image, caption, sort_order FROM article_gallery_images \
         WHERE article_id = ? ORDER BY sort_order, id",
    )
    .bind(article.id)
    .fetch_all(db)
    .await
    .context("Failed to load article gallery")?;
    article.gallery = rows
        .iter()
        .map(|row| {
            Ok(ArticleGalleryImage {
                id: row.try_get("id")?,
                image: row.try_get("image")?,
                caption: row.try_get("caption")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect::<Result<_>>()?;

    Ok(article)
}

/// Load tags for the given articles, keyed by article id and ordered by title.
async fn load_tags(db: &SqlitePool, article_ids: &[i64]) -> Result<HashMap<i64, Vec<ArticleTag>>> {
    let mut map: HashMap<i64, Vec<ArticleTag>> = HashMap::new();
    if article_ids.is_empty() {
        return Ok(map);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT l.article_id, t.id, t.title, t.slug FROM article_tag_links l \
         JOIN article_tags t ON t.id = l.tag_id WHERE l.article_id",
    );
    push_id_list(&mut qb, article_ids);
    qb.push(" ORDER BY t.title, t.id");

    let rows = qb
        .build()
        .fetch_all(db)
        .await
        .context("Failed to load article tags")?;

    for row in rows {
        let article_id: i64 = row.try_get("article_id")?;
        map.entry(article_id).or_default().push(row_to_tag(&row)?);
    }

    Ok(map)
}

fn row_to_article(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        cover_image: row.try_get("cover_image")?,
        header_image: row.try_get("header_image")?,
        published_at: row.try_get("published_at")?,
        updated_at: row.try_get("updated_at")?,
        is_published: row.try_get("is_published")?,
        is_featured: row.try_get("is_featured")?,
        seo_title: row.try_get("seo_title")?,
        seo_description: row.try_get("seo_description")?,
        reading_time: row.try_get("reading_time")?,
        tags: Vec::new(),
        sections: Vec::new(),
        gallery: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTagRepository, TagRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{split_search_terms, ArticleSectionInput, GalleryImageInput};

    async fn setup() -> (SqlxArticleRepository, SqlxTagRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxArticleRepository::new(pool.clone()),
            SqlxTagRepository::new(pool),
        )
    }

    fn input(title: &str) -> ArticleInput {
        serde_json::from_value(serde_json::json!({ "title": title })).unwrap()
    }

    #[tokio::test]
    async fn test_create_with_children() {
        let (repo, tags) = setup().await;
        let tag = tags.create("Бег", "бег").await.unwrap();

        let mut new = input("Первый старт");
        new.tag_ids = vec![tag.id];
        new.sections = vec![
            ArticleSectionInput {
                title: "Второй".into(),
                content: "b".into(),
                order: 2,
            },
            ArticleSectionInput {
                title: "Первый".into(),
                content: "a".into(),
                order: 1,
            },
        ];
        new.gallery = vec![GalleryImageInput {
            image: "blog/1.jpg".into(),
            caption: "Финиш".into(),
            order: 0,
        }];

        let article = repo.create("первый-старт", &new).await.unwrap();
        assert_eq!(article.tags, vec![tag]);
        assert_eq!(article.sections[0].title, "Первый");
        assert_eq!(article.gallery.len(), 1);
        assert!(article.is_published);
        assert_eq!(article.reading_time, 5);
    }

    #[tokio::test]
    async fn test_unpublished_hidden_from_public_queries() {
        let (repo, _) = setup().await;
        let mut draft = input("Черновик");
        draft.is_published = false;
        repo.create("draft", &draft).await.unwrap();
        repo.create("live", &input("Live")).await.unwrap();

        let public = repo.list(&ArticleFilter::default()).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].slug, "live");

        assert!(repo.get_by_slug("draft", false).await.unwrap().is_none());
        assert!(repo.get_by_slug("draft", true).await.unwrap().is_some());

        let all = repo
            .list(&ArticleFilter {
                include_unpublished: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_filters_and_ordering() {
        let (repo, tags) = setup().await;
        let run = tags.create("Run", "run").await.unwrap();
        let bike = tags.create("Bike", "bike").await.unwrap();

        let mut a = input("Marathon recap");
        a.tag_ids = vec![run.id, bike.id];
        a.reading_time = 12;
        a.is_featured = true;
        repo.create("a", &a).await.unwrap();

        let mut b = input("Bike fitting");
        b.tag_ids = vec![bike.id];
        b.reading_time = 3;
        repo.create("b", &b).await.unwrap();

        let by_slug = repo
            .list(&ArticleFilter {
                tag_slug: Some("run".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_slug.len(), 1);
        assert_eq!(by_slug[0].tags.len(), 2);
        assert_eq!(by_slug[0].tags[0].title, "Bike");

        let by_id = repo
            .list(&ArticleFilter {
                tag_id: Some(bike.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_id.len(), 2);

        let not_featured = repo
            .list(&ArticleFilter {
                featured: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(not_featured.len(), 1);
        assert_eq!(not_featured[0].slug, "b");

        let shortest_first = repo
            .list(&ArticleFilter {
                ordering: ArticleSort::parse_list("reading_time"),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(shortest_first[0].slug, "b");

        let found = repo
            .list(&ArticleFilter {
                search: split_search_terms("MARATHON"),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "a");
    }

    #[tokio::test]
    async fn test_update_replaces_children() {
        let (repo, tags) = setup().await;
        let tag = tags.create("Run", "run").await.unwrap();

        let mut new = input("Old");
        new.tag_ids = vec![tag.id];
        new.sections = vec![ArticleSectionInput {
            title: "s".into(),
            content: String::new(),
            order: 0,
        }];
        let created = repo.create("old", &new).await.unwrap();

        let replacement = input("New");
        let updated = repo.update(created.id, "new", &replacement).await.unwrap().unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.slug, "new");
        assert!(updated.tags.is_empty());
        assert!(updated.sections.is_empty());
        assert_eq!(updated.published_at, created.published_at);
        assert!(updated.updated_at >= created.updated_at);

        assert!(repo.update(999, "x", &replacement).await.unwrap().is_none());
        assert!(repo.delete(created.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
