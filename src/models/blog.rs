//! Blog models
//!
//! This module provides:
//! - `Article` with its tags, sections and gallery
//! - `ArticleTag`
//! - `ArticleFilter` and `ArticleSort` for the public listing
//! - Input types used by the admin API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleTag {
    pub id: i64,
    /// Display title (unique, up to 60 characters)
    pub title: String,
    /// URL slug (unique, up to 80 characters)
    pub slug: String,
}

/// Blog article
///
/// `tags` is loaded for every query. `sections` and `gallery` are only loaded
/// for single-article lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    /// Stored media path, empty when unset
    pub cover_image: String,
    /// Stored media path, empty when unset
    pub header_image: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_published: bool,
    pub is_featured: bool,
    pub seo_title: String,
    pub seo_description: String,
    /// Estimated reading time in minutes
    pub reading_time: i64,
    #[serde(default)]
    pub tags: Vec<ArticleTag>,
    #[serde(default)]
    pub sections: Vec<ArticleSection>,
    #[serde(default)]
    pub gallery: Vec<ArticleGalleryImage>,
}

impl Article {
    /// Check that every term occurs in the title, excerpt or content,
    /// ignoring case. Terms must already be lowercase.
    pub fn matches_terms(&self, terms: &[String]) -> bool {
        if terms.is_empty() {
            return true;
        }
        let title = self.title.to_lowercase();
        let excerpt = self.excerpt.to_lowercase();
        let content = self.content.to_lowercase();

        terms.iter().all(|term| {
            title.contains(term.as_str())
                || excerpt.contains(term.as_str())
                || content.contains(term.as_str())
        })
    }
}

/// Titled block of article body text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSection {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleGalleryImage {
    pub id: i64,
    pub image: String,
    pub caption: String,
    pub order: i64,
}

/// Sortable article fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleSortField {
    PublishedAt,
    ReadingTime,
}

impl ArticleSortField {
    pub fn column(&self) -> &'static str {
        match self {
            ArticleSortField::PublishedAt => "published_at",
            ArticleSortField::ReadingTime => "reading_time",
        }
    }
}

/// One `ordering` term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleSort {
    pub field: ArticleSortField,
    pub descending: bool,
}

impl ArticleSort {
    /// Default listing order: newest first
    pub const DEFAULT: ArticleSort = ArticleSort {
        field: ArticleSortField::PublishedAt,
        descending: true,
    };

    /// Parse a comma separated `ordering` value such as `-reading_time,published_at`.
    ///
    /// Unknown fields are skipped. Returns an empty list when nothing valid
    /// remains, in which case callers fall back to `DEFAULT`.
    pub fn parse_list(raw: &str) -> Vec<ArticleSort> {
        raw.split(',')
            .map(str::trim)
            .filter_map(|term| {
                let (descending, name) = match term.strip_prefix('-') {
                    Some(name) => (true, name),
                    None => (false, term),
                };
                let field = match name {
                    "published_at" => ArticleSortField::PublishedAt,
                    "reading_time" => ArticleSortField::ReadingTime,
                    _ => return None,
                };
                Some(ArticleSort { field, descending })
            })
            .collect()
    }
}

/// Split a `search` value into lowercase terms on whitespace and commas.
pub fn split_search_terms(raw: &str) -> Vec<String> {
    raw.replace('\0', "")
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Filter for article listings
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    /// Only articles carrying the tag with this slug
    pub tag_slug: Option<String>,
    /// Only articles carrying the tag with this id
    pub tag_id: Option<i64>,
    /// `Some(true)` featured only, `Some(false)` non-featured only
    pub featured: Option<bool>,
    /// Lowercase search terms, all of which must match
    pub search: Vec<String>,
    pub ordering: Vec<ArticleSort>,
    /// Include unpublished articles (admin listings)
    pub include_unpublished: bool,
}

fn default_true() -> bool {
    true
}

fn default_reading_time() -> i64 {
    5
}

/// Admin input for creating or replacing an article
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    /// Generated from the title when blank
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub header_image: String,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    #[serde(default = "default_reading_time")]
    pub reading_time: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub sections: Vec<ArticleSectionInput>,
    #[serde(default)]
    pub gallery: Vec<GalleryImageInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleSectionInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: i64,
}

/// Gallery image input, shared by articles and camps
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryImageInput {
    pub image: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub order: i64,
}

/// Admin input for a tag
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
}
