//! Blog API endpoints
//!
//! - GET /api/blog/articles - Published articles
//! - GET /api/blog/articles/{slug} - Published article detail
//! - GET /api/blog/tags - Tag list
//! - GET /api/blog/tags/{slug} - Single tag

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{first_present, parse_flag, parse_id};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ArticleDetail, ArticleListItem};
use crate::models::{split_search_terms, ArticleFilter, ArticleSort, ArticleTag};

/// Query parameters for the article list
#[derive(Debug, Default, Deserialize)]
pub struct ArticleListQuery {
    #[serde(rename = "tags__slug")]
    pub tags_slug: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "tags__id")]
    pub tags_id: Option<String>,
    pub tag_id: Option<String>,
    pub is_featured: Option<String>,
    pub featured: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl ArticleListQuery {
    /// Build the repository filter; aliases apply when the main name is absent or blank
    pub fn filter(&self) -> Result<ArticleFilter, ApiError> {
        let tag_slug = first_present(self.tags_slug.as_deref(), self.tag.as_deref())
            .map(String::from);

        let (field, raw_id) = match first_present(self.tags_id.as_deref(), None) {
            Some(id) => ("tags__id", Some(id)),
            None => ("tag_id", self.tag_id.as_deref()),
        };
        let tag_id = parse_id(field, raw_id)?;

        let featured = parse_flag(first_present(
            self.is_featured.as_deref(),
            self.featured.as_deref(),
        ));

        Ok(ArticleFilter {
            tag_slug,
            tag_id,
            featured,
            search: self
                .search
                .as_deref()
                .map(split_search_terms)
                .unwrap_or_default(),
            ordering: self
                .ordering
                .as_deref()
                .map(ArticleSort::parse_list)
                .unwrap_or_default(),
            include_unpublished: false,
        })
    }
}

/// Build the blog router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/{slug}", get(get_article))
        .route("/tags", get(list_tags))
        .route("/tags/{slug}", get(get_tag))
}

/// GET /api/blog/articles
async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleListQuery>,
) -> Result<Json<Vec<ArticleListItem>>, ApiError> {
    let filter = query.filter()?;
    let articles = state.blog_service.list_articles(&filter).await?;

    Ok(Json(
        articles
            .iter()
            .map(|article| ArticleListItem::new(article, &state.media))
            .collect(),
    ))
}

/// GET /api/blog/articles/{slug}
async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleDetail>, ApiError> {
    let article = state.blog_service.get_published(&slug).await?;
    Ok(Json(ArticleDetail::new(article, &state.media)))
}

/// GET /api/blog/tags
async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<ArticleTag>>, ApiError> {
    Ok(Json(state.blog_service.list_tags().await?))
}

/// GET /api/blog/tags/{slug}
async fn get_tag(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleTag>, ApiError> {
    Ok(Json(state.blog_service.get_tag_by_slug(&slug).await?))
}
