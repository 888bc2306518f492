//! Coach repository

use crate::db::DynDatabasePool;
use crate::models::{Coach, CoachFilter, CoachInput, TrainingDirection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::catalog::row_to_direction;
use super::{count_rows, missing_ids, push_id_list, slug_taken};

/// Coach repository trait
#[async_trait]
pub trait CoachRepository: Send + Sync {
    /// Coaches matching the filter, ordered by full name, with directions
    async fn list(&self, filter: &CoachFilter) -> Result<Vec<Coach>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Coach>>;

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn create(&self, slug: &str, input: &CoachInput) -> Result<Coach>;

    async fn update(&self, id: i64, slug: &str, input: &CoachInput) -> Result<Option<Coach>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Ids from `ids` that match no coach
    async fn missing(&self, ids: &[i64]) -> Result<Vec<i64>>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based coach repository implementation
pub struct SqlxCoachRepository {
    pool: DynDatabasePool,
}

impl SqlxCoachRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CoachRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }
}

const COACH_COLUMNS: &str = "c.id, c.full_name, c.slug, c.role, c.bio, c.achievements, \
     c.experience_years, c.photo, c.instagram, c.telegram, c.phone, c.email, c.is_featured";

#[async_trait]
impl CoachRepository for SqlxCoachRepository {
    async fn list(&self, filter: &CoachFilter) -> Result<Vec<Coach>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM coaches c WHERE 1 = 1", COACH_COLUMNS));

        if let Some(featured) = filter.featured {
            qb.push(" AND c.is_featured = ").push_bind(featured);
        }
        if let Some(direction_id) = filter.direction_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM coach_directions cd \
                 WHERE cd.coach_id = c.id AND cd.direction_id = ",
            )
            .push_bind(direction_id)
            .push(")");
        }
        qb.push(" ORDER BY c.full_name, c.id");

        let rows = qb
            .build()
            .fetch_all(self.db())
            .await
            .context("Failed to list coaches")?;

        let mut coaches = rows.iter().map(row_to_coach).collect::<Result<Vec<_>>>()?;
        attach_directions(self.db(), &mut coaches).await?;
        Ok(coaches)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Coach>> {
        let mut coaches = load_coaches(self.db(), &[id]).await?;
        Ok(coaches.remove(&id))
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        slug_taken(self.db(), "coaches", slug, exclude_id).await
    }

    async fn create(&self, slug: &str, input: &CoachInput) -> Result<Coach> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO coaches (full_name, slug, role, bio, achievements, experience_years,
                photo, instagram, telegram, phone, email, is_featured)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.full_name)
        .bind(slug)
        .bind(&input.role)
        .bind(&input.bio)
        .bind(&input.achievements)
        .bind(input.experience_years)
        .bind(&input.photo)
        .bind(&input.instagram)
        .bind(&input.telegram)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.is_featured)
        .execute(&mut *tx)
        .await
        .context("Failed to create coach")?;

        let id = result.last_insert_rowid();
        write_directions(&mut tx, id, &input.direction_ids).await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Coach not found after insert"))
    }

    async fn update(&self, id: i64, slug: &str, input: &CoachInput) -> Result<Option<Coach>> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE coaches
            SET full_name = ?, slug = ?, role = ?, bio = ?, achievements = ?,
                experience_years = ?, photo = ?, instagram = ?, telegram = ?, phone = ?,
                email = ?, is_featured = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.full_name)
        .bind(slug)
        .bind(&input.role)
        .bind(&input.bio)
        .bind(&input.achievements)
        .bind(input.experience_years)
        .bind(&input.photo)
        .bind(&input.instagram)
        .bind(&input.telegram)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.is_featured)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update coach")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM coach_directions WHERE coach_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear coach directions")?;
        write_directions(&mut tx, id, &input.direction_ids).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM coaches WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete coach")?;

        Ok(result.rows_affected() > 0)
    }

    async fn missing(&self, ids: &[i64]) -> Result<Vec<i64>> {
        missing_ids(self.db(), "coaches", ids).await
    }

    async fn count(&self) -> Result<i64> {
        count_rows(self.db(), "coaches").await
    }
}

async fn write_directions(conn: &mut SqliteConnection, coach_id: i64, ids: &[i64]) -> Result<()> {
    for direction_id in ids {
        sqlx::query("INSERT OR IGNORE INTO coach_directions (coach_id, direction_id) VALUES (?, ?)")
            .bind(coach_id)
            .bind(*direction_id)
            .execute(&mut *conn)
            .await
            .context("Failed to link coach direction")?;
    }
    Ok(())
}

/// Load complete coaches by id, keyed by id.
///
/// Shared with the schedule and camp repositories, which embed coaches.
pub(crate) async fn load_coaches(db: &SqlitePool, ids: &[i64]) -> Result<HashMap<i64, Coach>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM coaches c WHERE c.id", COACH_COLUMNS));
    push_id_list(&mut qb, ids);

    let rows = qb
        .build()
        .fetch_all(db)
        .await
        .context("Failed to load coaches")?;

    let mut coaches = rows.iter().map(row_to_coach).collect::<Result<Vec<_>>>()?;
    attach_directions(db, &mut coaches).await?;

    Ok(coaches.into_iter().map(|c| (c.id, c)).collect())
}

async fn attach_directions(db: &SqlitePool, coaches: &mut [Coach]) -> Result<()> {
    if coaches.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = coaches.iter().map(|c| c.id).collect();

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT cd.coach_id, d.id, d.title, d.description, d.icon FROM coach_directions cd \
         JOIN training_directions d ON d.id = cd.direction_id WHERE cd.coach_id",
    );
    push_id_list(&mut qb, &ids);
    qb.push(" ORDER BY d.title, d.id");

    let rows = qb
        .build()
        .fetch_all(db)
        .await
        .context("Failed to load coach directions")?;

    let mut by_coach: HashMap<i64, Vec<TrainingDirection>> = HashMap::new();
    for row in rows {
        let coach_id: i64 = row.try_get("coach_id")?;
        by_coach.entry(coach_id).or_default().push(row_to_direction(&row, "")?);
    }
    for coach in coaches.iter_mut() {
        coach.directions = by_coach.remove(&coach.id).unwrap_or_default();
    }
    Ok(())
}

fn row_to_coach(row: &sqlx::sqlite::SqliteRow) -> Result<Coach> {
    Ok(Coach {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        slug: row.try_get("slug")?,
        role: row.try_get("role")?,
        bio: row.try_get("bio")?,
        achievements: row.try_get("achievements")?,
        experience_years: row.try_get("experience_years")?,
        photo: row.try_get("photo")?,
        instagram: row.try_get("instagram")?,
        telegram: row.try_get("telegram")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        is_featured: row.try_get("is_featured")?,
        directions: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{CatalogRepository, SqlxCatalogRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::DirectionInput;

    async fn setup() -> (SqlxCoachRepository, SqlxCatalogRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxCoachRepository::new(pool.clone()),
            SqlxCatalogRepository::new(pool),
        )
    }

    fn input(name: &str, direction_ids: Vec<i64>) -> CoachInput {
        let mut input: CoachInput =
            serde_json::from_value(serde_json::json!({ "full_name": name })).unwrap();
        input.direction_ids = direction_ids;
        input
    }

    async fn direction(catalog: &SqlxCatalogRepository, title: &str) -> i64 {
        catalog
            .create_direction(&DirectionInput {
                title: title.into(),
                description: String::new(),
                icon: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_and_filter() {
        let (repo, catalog) = setup().await;
        let run = direction(&catalog, "Бег").await;
        let swim = direction(&catalog, "Плавание").await;

        let mut ivan = input("Иван Петров", vec![run, swim]);
        ivan.is_featured = true;
        let ivan = repo.create("иван-петров", &ivan).await.unwrap();
        assert_eq!(ivan.directions.len(), 2);
        assert_eq!(ivan.directions[0].title, "Бег");

        repo.create("анна", &input("Анна Смирнова", vec![swim])).await.unwrap();

        let all = repo.list(&CoachFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].full_name, "Анна Смирнова");

        let runners = repo
            .list(&CoachFilter {
                direction_id: Some(run),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(runners.len(), 1);
        assert_eq!(runners[0].id, ivan.id);

        let featured = repo
            .list(&CoachFilter {
                featured: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(featured.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_directions() {
        let (repo, catalog) = setup().await;
        let run = direction(&catalog, "Бег").await;
        let bike = direction(&catalog, "Вело").await;

        let coach = repo.create("c", &input("C", vec![run])).await.unwrap();
        let updated = repo
            .update(coach.id, "c", &input("C", vec![bike]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.directions.len(), 1);
        assert_eq!(updated.directions[0].id, bike);

        assert!(repo.update(404, "x", &input("X", vec![])).await.unwrap().is_none());
        assert_eq!(repo.missing(&[coach.id, 404]).await.unwrap(), vec![404]);
        assert!(repo.delete(coach.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
