//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one aggregate; child collections
//! are written in the same transaction as their parent.

pub mod article;
pub mod camp;
pub mod catalog;
pub mod coach;
pub mod lead;
pub mod pricing;
pub mod schedule;
pub mod session;
pub mod site;
pub mod tag;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use camp::{CampRepository, SqlxCampRepository};
pub use catalog::{CatalogRepository, SqlxCatalogRepository};
pub use coach::{CoachRepository, SqlxCoachRepository};
pub use lead::{LeadRepository, SqlxLeadRepository};
pub use pricing::{PricingRepository, SqlxPricingRepository};
pub use schedule::{ScheduleRepository, SqlxScheduleRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use site::{SiteRepository, SqlxSiteRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;

/// Check whether `slug` is taken in `table`, optionally ignoring one row.
///
/// `table` must be a trusted identifier, never user input.
pub(crate) async fn slug_taken(
    db: &SqlitePool,
    table: &'static str,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE slug = ", table));
    qb.push_bind(slug);
    if let Some(id) = exclude_id {
        qb.push(" AND id != ").push_bind(id);
    }

    let count: i64 = qb
        .build_query_scalar()
        .fetch_one(db)
        .await
        .with_context(|| format!("Failed to check slug in {}", table))?;

    Ok(count > 0)
}

/// Return the ids from `ids` that have no row in `table`.
///
/// `table` must be a trusted identifier, never user input.
pub(crate) async fn missing_ids(
    db: &SqlitePool,
    table: &'static str,
    ids: &[i64],
) -> Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT id FROM {} WHERE id IN (", table));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let found: HashSet<i64> = qb
        .build_query_scalar::<i64>()
        .fetch_all(db)
        .await
        .with_context(|| format!("Failed to look up ids in {}", table))?
        .into_iter()
        .collect();

    let mut missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    missing.dedup();
    Ok(missing)
}

/// Count rows of a table, for dashboard statistics.
pub(crate) async fn count_rows(db: &SqlitePool, table: &'static str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db)
        .await
        .with_context(|| format!("Failed to count {}", table))?;
    Ok(count)
}

/// Push ` IN (?, ?, ...)` for `ids` onto a query.
pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push(" IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_missing_ids() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        // Levels 1..=4 are seeded
        let missing = missing_ids(pool.sqlite(), "level_tags", &[1, 4, 9, 12])
            .await
            .unwrap();
        assert_eq!(missing, vec![9, 12]);
        assert!(missing_ids(pool.sqlite(), "level_tags", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slug_taken() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        sqlx::query("INSERT INTO article_tags (title, slug) VALUES ('Бег', 'бег')")
            .execute(pool.sqlite())
            .await
            .unwrap();

        assert!(slug_taken(pool.sqlite(), "article_tags", "бег", None).await.unwrap());
        assert!(!slug_taken(pool.sqlite(), "article_tags", "бег", Some(1)).await.unwrap());
        assert!(!slug_taken(pool.sqlite(), "article_tags", "вело", None).await.unwrap());
        assert_eq!(count_rows(pool.sqlite(), "article_tags").await.unwrap(), 1);
    }
}
