//! Camp repository

use crate::db::DynDatabasePool;
use crate::models::{
    Camp, CampDay, CampFilter, CampGalleryImage, CampHighlight, CampInclusion, CampInput,
    CampStatus, Coach, Money,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

use super::coach::load_coaches;
use super::{count_rows, slug_taken};

const CAMP_COLUMNS: &str = "id, title, slug, summary, description, start_date, end_date, \
     price_from, location, hero_image, header_image, registration_link, status, is_featured, \
     logistics, target_audience, created_at, updated_at";

const CHILD_TABLES: [&str; 5] = [
    "camp_highlights",
    "camp_days",
    "camp_gallery_images",
    "camp_inclusions",
    "camp_trainers",
];

/// Camp repository trait
#[async_trait]
pub trait CampRepository: Send + Sync {
    /// Camps matching the filter, newest start date first, without children
    async fn list(&self, filter: &CampFilter) -> Result<Vec<Camp>>;

    /// Camp with all child collections and trainers
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Camp>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Camp>>;

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn create(&self, slug: &str, input: &CampInput) -> Result<Camp>;

    async fn update(&self, id: i64, slug: &str, input: &CampInput) -> Result<Option<Camp>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based camp repository implementation
pub struct SqlxCampRepository {
    pool: DynDatabasePool,
}

impl SqlxCampRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CampRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }

    async fn load_children(&self, camp: &mut Camp) -> Result<()> {
        let db = self.db();

        camp.highlights = sqlx::query(
            "SELECT id, text, sort_order FROM camp_highlights WHERE camp_id = ? ORDER BY sort_order, id",
        )
        .bind(camp.id)
        .fetch_all(db)
        .await
        .context("Failed to load camp highlights")?
        .iter()
        .map(|row| {
            Ok(CampHighlight {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect::<Result<_>>()?;

        camp.program = sqlx::query(
            "SELECT id, day_number, title, description FROM camp_days WHERE camp_id = ? ORDER BY day_number, id",
        )
        .bind(camp.id)
        .fetch_all(db)
        .await
        .context("Failed to load camp program")?
        .iter()
        .map(|row| {
            Ok(CampDay {
                id: row.try_get("id")?,
                day_number: row.try_get("day_number")?,
                title: row.try_get("title")?,
                description: row.try_get("description")?,
            })
        })
        .collect::<Result<_>>()?;

        camp.gallery = sqlx::query(
            "SELECT id, image, caption, sort_order FROM camp_gallery_images WHERE camp_id = ? ORDER BY sort_order, id",
        )
        .bind(camp.id)
        .fetch_all(db)
        .await
        .context("Failed to load camp gallery")?
        .iter()
        .map(|row| {
            Ok(CampGalleryImage {
                id: row.try_get("id")?,
                image: row.try_get("image")?,
                caption: row.try_get("caption")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect::<Result<_>>()?;

        camp.inclusions = sqlx::query(
            "SELECT id, text, sort_order FROM camp_inclusions WHERE camp_id = ? ORDER BY sort_order, id",
        )
        .bind(camp.id)
        .fetch_all(db)
        .await
        .context("Failed to load camp inclusions")?
        .iter()
        .map(|row| {
            Ok(CampInclusion {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect::<Result<_>>()?;

        let trainer_ids: Vec<i64> =
            sqlx::query_scalar("SELECT coach_id FROM camp_trainers WHERE camp_id = ?")
                .bind(camp.id)
                .fetch_all(db)
                .await
                .context("Failed to load camp trainers")?;
        let mut trainers: Vec<Coach> = load_coaches(db, &trainer_ids).await?.into_values().collect();
        trainers.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        camp.trainers = trainers;

        Ok(())
    }

    async fn fetch_one(&self, key: CampKey<'_>) -> Result<Option<Camp>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM camps WHERE ", CAMP_COLUMNS));
        match key {
            CampKey::Id(id) => qb.push("id = ").push_bind(id),
            CampKey::Slug(slug) => qb.push("slug = ").push_bind(slug),
        };

        let row = qb
            .build()
            .fetch_optional(self.db())
            .await
            .context("Failed to get camp")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut camp = row_to_camp(&row)?;
        self.load_children(&mut camp).await?;
        Ok(Some(camp))
    }
}

enum CampKey<'a> {
    Id(i64),
    Slug(&'a str),
}

#[async_trait]
impl CampRepository for SqlxCampRepository {
    async fn list(&self, filter: &CampFilter) -> Result<Vec<Camp>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM camps WHERE 1 = 1", CAMP_COLUMNS));

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND is_featured = ").push_bind(featured);
        }
        if filter.upcoming {
            qb.push(" AND (status = ")
                .push_bind(CampStatus::Upcoming.as_str())
                .push(" OR start_date >= ")
                .push_bind(filter.today)
                .push(")");
        }
        if filter.past {
            qb.push(" AND (status = ")
                .push_bind(CampStatus::Completed.as_str())
                .push(" OR end_date < ")
                .push_bind(filter.today)
                .push(")");
        }
        qb.push(" ORDER BY start_date DESC, id DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb
            .build()
            .fetch_all(self.db())
            .await
            .context("Failed to list camps")?;

        rows.iter().map(row_to_camp).collect()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Camp>> {
        self.fetch_one(CampKey::Slug(slug)).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Camp>> {
        self.fetch_one(CampKey::Id(id)).await
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        slug_taken(self.db(), "camps", slug, exclude_id).await
    }

    async fn create(&self, slug: &str, input: &CampInput) -> Result<Camp> {
        let now = Utc::now();
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO camps (title, slug, summary, description, start_date, end_date,
                price_from, location, hero_image, header_image, registration_link, status,
                is_featured, logistics, target_audience, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(slug)
        .bind(&input.summary)
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.price_from.minor())
        .bind(&input.location)
        .bind(&input.hero_image)
        .bind(&input.header_image)
        .bind(&input.registration_link)
        .bind(input.status.as_str())
        .bind(input.is_featured)
        .bind(&input.logistics)
        .bind(&input.target_audience)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create camp")?;

        let id = result.last_insert_rowid();
        write_children(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Camp not found after insert"))
    }

    async fn update(&self, id: i64, slug: &str, input: &CampInput) -> Result<Option<Camp>> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE camps
            SET title = ?, slug = ?, summary = ?, description = ?, start_date = ?,
                end_date = ?, price_from = ?, location = ?, hero_image = ?, header_image = ?,
                registration_link = ?, status = ?, is_featured = ?, logistics = ?,
                target_audience = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(slug)
        .bind(&input.summary)
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.price_from.minor())
        .bind(&input.location)
        .bind(&input.hero_image)
        .bind(&input.header_image)
        .bind(&input.registration_link)
        .bind(input.status.as_str())
        .bind(input.is_featured)
        .bind(&input.logistics)
        .bind(&input.target_audience)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update camp")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        for table in CHILD_TABLES {
            sqlx::query(&format!("DELETE FROM {} WHERE camp_id = ?", table))
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
        let result = sqlx::query("DELETE FROM camps WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete camp")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        count_rows(self.db(), "camps").await
    }
}

async fn write_children(conn: &mut SqliteConnection, id: i64, input: &CampInput) -> Result<()> {
    for item in &input.highlights {
        sqlx::query("INSERT INTO camp_highlights (camp_id, text, sort_order) VALUES (?, ?, ?)")
            .bind(id)
            .bind(&item.text)
            .bind(item.order)
            .execute(&mut *conn)
            .await
            .context("Failed to insert camp highlight")?;
    }

    for day in &input.program {
        sqlx::query(
            "INSERT INTO camp_days (camp_id, day_number, title, description) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(day.day_number)
        .bind(&day.title)
        .bind(&day.description)
        .execute(&mut *conn)
        .await
        .context("Failed to insert camp day")?;
    }

    for image in &input.gallery {
        sqlx::query(
            "INSERT INTO camp_gallery_images (camp_id, image, caption, sort_order) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&image.image)
        .bind(&image.caption)
        .bind(image.order)
        .execute(&mut *conn)
        .await
        .context("Failed to insert camp gallery image")?;
    }

    for item in &input.inclusions {
        sqlx::query("INSERT INTO camp_inclusions (camp_id, text, sort_order) VALUES (?, ?, ?)")
            .bind(id)
            .bind(&item.text)
            .bind(item.order)
            .execute(&mut *conn)
            .await
            .context("Failed to insert camp inclusion")?;
    }

    for coach_id in &input.trainer_ids {
        sqlx::query("INSERT OR IGNORE INTO camp_trainers (camp_id, coach_id) VALUES (?, ?)")
            .bind(id)
            .bind(*coach_id)
            .execute(&mut *conn)
            .await
            .context("Failed to link camp trainer")?;
    }

    Ok(())
}

fn row_to_camp(row: &sqlx::sqlite::SqliteRow) -> Result<Camp> {
    let status: String = row.try_get("status")?;

    Ok(Camp {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        summary: row.try_get("summary")?,
        description: row.try_get("description")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        price_from: Money::from_minor(row.try_get("price_from")?),
        location: row.try_get("location")?,
        hero_image: row.try_get("hero_image")?,
        header_image: row.try_get("header_image")?,
        registration_link: row.try_get("registration_link")?,
        status: CampStatus::from_str(&status).unwrap_or_default(),
        is_featured: row.try_get("is_featured")?,
        logistics: row.try_get("logistics")?,
        target_audience: row.try_get("target_audience")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        highlights: Vec::new(),
        program: Vec::new(),
        gallery: Vec::new(),
        inclusions: Vec::new(),
        trainers: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{CoachRepository, SqlxCoachRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::parse_date;

    async fn setup() -> (DynDatabasePool, SqlxCampRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (pool.clone(), SqlxCampRepository::new(pool))
    }

    fn input(title: &str, start: &str, end: &str, status: &str) -> CampInput {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "description": "Тренировки и отдых",
            "start_date": start,
            "end_date": end,
            "price_from": "45000.00",
            "location": "Сочи",
            "status": status,
        }))
        .unwrap()
    }

    fn filter(today: &str) -> CampFilter {
        CampFilter::new(parse_date(today).unwrap())
    }

    #[tokio::test]
    async fn test_create_with_children() {
        let (pool, repo) = setup().await;
        let coaches = SqlxCoachRepository::new(pool);
        let anna: crate::models::CoachInput =
            serde_json::from_value(serde_json::json!({"full_name": "Анна"})).unwrap();
        let boris: crate::models::CoachInput =
            serde_json::from_value(serde_json::json!({"full_name": "Борис"})).unwrap();
        let boris_id = coaches.create("boris", &boris).await.unwrap().id;
        let anna_id = coaches.create("anna", &anna).await.unwrap().id;

        let mut camp = input("Горы", "2026-07-01", "2026-07-07", "upcoming");
        camp.highlights = serde_json::from_value(serde_json::json!([
            {"text": "Второй", "order": 2},
            {"text": "Первый", "order": 1}
        ]))
        .unwrap();
        camp.program = serde_json::from_value(serde_json::json!([
            {"day_number": 2, "title": "Длинная"},
            {"title": "Заезд"}
        ]))
        .unwrap();
        camp.inclusions =
            serde_json::from_value(serde_json::json!([{"text": "Проживание"}])).unwrap();
        camp.trainer_ids = vec![boris_id, anna_id];

        let created = repo.create("gory", &camp).await.unwrap();
        assert_eq!(created.price_from.to_string(), "45000.00");
        assert_eq!(created.highlights[0].text, "Первый");
        assert_eq!(created.program[0].title, "Заезд");
        assert_eq!(created.program[1].day_number, 2);
        assert_eq!(created.inclusions.len(), 1);
        let names: Vec<&str> = created.trainers.iter().map(|c| c.full_name.as_str()).collect();
        assert_eq!(names, vec!["Анна", "Борис"]);
    }

    #[tokio::test]
    async fn test_drafts_filter_by_status() {
        let (_, repo) = setup().await;
        repo.create("draft", &input("Черновик", "2026-07-01", "2026-07-02", "draft"))
            .await
            .unwrap();
        repo.create("open", &input("Анонс", "2026-08-01", "2026-08-02", "upcoming"))
            .await
            .unwrap();

        assert_eq!(repo.list(&filter("2026-01-01")).await.unwrap().len(), 2);
        assert!(repo.get_by_slug("draft").await.unwrap().is_some());

        let mut drafts = filter("2026-01-01");
        drafts.status = Some(CampStatus::Draft);
        let found = repo.list(&drafts).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "draft");
    }

    #[tokio::test]
    async fn test_upcoming_and_past() {
        let (_, repo) = setup().await;
        // Announced but already over
        repo.create("a", &input("A", "2026-01-10", "2026-01-15", "upcoming"))
            .await
            .unwrap();
        // Completed in the future (status wins for past)
        repo.create("b", &input("B", "2026-09-01", "2026-09-05", "completed"))
            .await
            .unwrap();
        // Completed long ago
        repo.create("c", &input("C", "2025-06-01", "2025-06-05", "completed"))
            .await
            .unwrap();

        let mut upcoming = filter("2026-05-01");
        upcoming.upcoming = true;
        let slugs: Vec<String> = repo
            .list(&upcoming)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec!["b", "a"]);

        let mut past = filter("2026-05-01");
        past.past = true;
        let slugs: Vec<String> = repo
            .list(&past)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec!["b", "a", "c"]);

        let mut limited = filter("2026-05-01");
        limited.limit = Some(1);
        assert_eq!(repo.list(&limited).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_children() {
        let (_, repo) = setup().await;
        let mut camp = input("Горы", "2026-07-01", "2026-07-07", "upcoming");
        camp.inclusions = serde_json::from_value(serde_json::json!([{"text": "Питание"}])).unwrap();
        let created = repo.create("gory", &camp).await.unwrap();

        camp.inclusions.clear();
        camp.status = CampStatus::Completed;
        let updated = repo
            .update(created.id, "gory-2026", &camp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.slug, "gory-2026");
        assert_eq!(updated.status, CampStatus::Completed);
        assert!(updated.inclusions.is_empty());

        assert!(repo.slug_taken("gory-2026", None).await.unwrap());
        assert!(!repo.slug_taken("gory-2026", Some(created.id)).await.unwrap());
        assert!(repo.update(999, "x", &camp).await.unwrap().is_none());
        assert!(repo.delete(created.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
