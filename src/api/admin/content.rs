//! Blog and camp management
//!
//! - /api/admin/articles[/{id}] - All articles, drafts included
//! - /api/admin/tags[/{id}]
//! - /api/admin/camps[/{id}] - All camps, drafts included

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Local;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{
    Article, ArticleFilter, ArticleInput, ArticleTag, Camp, CampFilter, CampInput, TagInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{id}", get(get_tag).put(update_tag).delete(delete_tag))
        .route("/camps", get(list_camps).post(create_camp))
        .route("/camps/{id}", get(get_camp).put(update_camp).delete(delete_camp))
}

// ---- articles ----

async fn list_articles(State(state): State<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    let filter = ArticleFilter {
        include_unpublished: true,
        ..Default::default()
    };
    Ok(Json(state.blog_service.list_articles(&filter).await?))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.blog_service.get_article(id).await?))
}

async fn create_article(
    State(state): State<AppState>,
    Json(body): Json<ArticleInput>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let article = state.blog_service.create_article(&body).await?;
    tracing::info!(article_id = article.id, slug = %article.slug, "Article created");
    Ok((StatusCode::CREATED, Json(article)))
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ArticleInput>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.blog_service.update_article(id, &body).await?))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete_article(id).await?;
    tracing::info!(article_id = id, "Article deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---- tags ----

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<ArticleTag>>, ApiError> {
    Ok(Json(state.blog_service.list_tags().await?))
}

async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleTag>, ApiError> {
    Ok(Json(state.blog_service.get_tag(id).await?))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(body): Json<TagInput>,
) -> Result<(StatusCode, Json<ArticleTag>), ApiError> {
    let tag = state.blog_service.create_tag(&body).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TagInput>,
) -> Result<Json<ArticleTag>, ApiError> {
    Ok(Json(state.blog_service.update_tag(id, &body).await?))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- camps ----

async fn list_camps(State(state): State<AppState>) -> Result<Json<Vec<Camp>>, ApiError> {
    let filter = CampFilter::new(Local::now().date_naive());
    Ok(Json(state.camp_service.list(&filter).await?))
}

async fn get_camp(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Camp>, ApiError> {
    Ok(Json(state.camp_service.get(id).await?))
}

async fn create_camp(
    State(state): State<AppState>,
    Json(body): Json<CampInput>,
) -> Result<(StatusCode, Json<Camp>), ApiError> {
    let camp = state.camp_service.create(&body).await?;
    tracing::info!(camp_id = camp.id, slug = %camp.slug, "Camp created");
    Ok((StatusCode::CREATED, Json(camp)))
}

async fn update_camp(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CampInput>,
) -> Result<Json<Camp>, ApiError> {
    Ok(Json(state.camp_service.update(id, &body).await?))
}

async fn delete_camp(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.camp_service.delete(id).await?;
    tracing::info!(camp_id = id, "Camp deleted");
    Ok(StatusCode::NO_CONTENT)
}
