//! Training catalog repository
//!
//! Reference data for the schedule: directions, locations and levels.

use crate::db::DynDatabasePool;
use crate::models::{DirectionInput, Level, LevelTag, Location, LocationInput, TrainingDirection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

use super::missing_ids;

/// Catalog repository trait
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All directions ordered by title
    async fn list_directions(&self) -> Result<Vec<TrainingDirection>>;
    async fn get_direction(&self, id: i64) -> Result<Option<TrainingDirection>>;
    async fn create_direction(&self, input: &DirectionInput) -> Result<TrainingDirection>;
    async fn update_direction(
        &self,
        id: i64,
        input: &DirectionInput,
    ) -> Result<Option<TrainingDirection>>;
    async fn delete_direction(&self, id: i64) -> Result<bool>;
    /// Ids from `ids` that match no direction
    async fn missing_directions(&self, ids: &[i64]) -> Result<Vec<i64>>;

    /// All locations ordered by title
    async fn list_locations(&self) -> Result<Vec<Location>>;
    async fn get_location(&self, id: i64) -> Result<Option<Location>>;
    async fn create_location(&self, input: &LocationInput) -> Result<Location>;
    async fn update_location(&self, id: i64, input: &LocationInput) -> Result<Option<Location>>;
    async fn delete_location(&self, id: i64) -> Result<bool>;

    /// All levels ordered by tag
    async fn list_levels(&self) -> Result<Vec<LevelTag>>;
    /// Ids from `ids` that match no level
    async fn missing_levels(&self, ids: &[i64]) -> Result<Vec<i64>>;
}

/// SQLx-based catalog repository implementation
pub struct SqlxCatalogRepository {
    pool: DynDatabasePool,
}

impl SqlxCatalogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CatalogRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }
}

#[async_trait]
impl CatalogRepository for SqlxCatalogRepository {
    async fn list_directions(&self) -> Result<Vec<TrainingDirection>> {
        let rows = sqlx::query(
            "SELECT id, title, description, icon FROM training_directions ORDER BY title, id",
        )
        .fetch_all(self.db())
        .await
        .context("Failed to list directions")?;

        rows.iter().map(|row| row_to_direction(row, "")).collect()
    }

    async fn get_direction(&self, id: i64) -> Result<Option<TrainingDirection>> {
        let row =
            sqlx::query("SELECT id, title, description, icon FROM training_directions WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db())
                .await
                .context("Failed to get direction")?;

        row.as_ref().map(|row| row_to_direction(row, "")).transpose()
    }

    async fn create_direction(&self, input: &DirectionInput) -> Result<TrainingDirection> {
        let result =
            sqlx::query("INSERT INTO training_directions (title, description, icon) VALUES (?, ?, ?)")
                .bind(&input.title)
                .bind(&input.description)
                .bind(&input.icon)
                .execute(self.db())
                .await
                .context("Failed to create direction")?;

        Ok(TrainingDirection {
            id: result.last_insert_rowid(),
            title: input.title.clone(),
            description: input.description.clone(),
            icon: input.icon.clone(),
        })
    }

    async fn update_direction(
        &self,
        id: i64,
        input: &DirectionInput,
    ) -> Result<Option<TrainingDirection>> {
        let result = sqlx::query(
            "UPDATE training_directions SET title = ?, description = ?, icon = ? WHERE id = ?",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.icon)
        .bind(id)
        .execute(self.db())
        .await
        .context("Failed to update direction")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_direction(id).await
    }

    async fn delete_direction(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM training_directions WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete direction")?;

        Ok(result.rows_affected() > 0)
    }

    async fn missing_directions(&self, ids: &[i64]) -> Result<Vec<i64>> {
        missing_ids(self.db(), "training_directions", ids).await
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        let rows = sqlx::query(
            "SELECT id, title, address, latitude, longitude FROM locations ORDER BY title, id",
        )
        .fetch_all(self.db())
        .await
        .context("Failed to list locations")?;

        rows.iter().map(|row| row_to_location(row, "")).collect()
    }

    async fn get_location(&self, id: i64) -> Result<Option<Location>> {
        let row =
            sqlx::query("SELECT id, title, address, latitude, longitude FROM locations WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db())
                .await
                .context("Failed to get location")?;

        row.as_ref().map(|row| row_to_location(row, "")).transpose()
    }

    async fn create_location(&self, input: &LocationInput) -> Result<Location> {
        let result = sqlx::query(
            "INSERT INTO locations (title, address, latitude, longitude) VALUES (?, ?, ?, ?)",
        )
        .bind(&input.title)
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .execute(self.db())
        .await
        .context("Failed to create location")?;

        Ok(Location {
            id: result.last_insert_rowid(),
            title: input.title.clone(),
            address: input.address.clone(),
            latitude: input.latitude,
            longitude: input.longitude,
        })
    }

    async fn update_location(&self, id: i64, input: &LocationInput) -> Result<Option<Location>> {
        let result = sqlx::query(
            "UPDATE locations SET title = ?, address = ?, latitude = ?, longitude = ? WHERE id = ?",
        )
        .bind(&input.title)
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(id)
        .execute(self.db())
        .await
        .context("Failed to update location")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_location(id).await
    }

    async fn delete_location(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete location")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_levels(&self) -> Result<Vec<LevelTag>> {
        let rows = sqlx::query("SELECT id, tag FROM level_tags ORDER BY tag")
            .fetch_all(self.db())
            .await
            .context("Failed to list levels")?;

        rows.iter().map(|row| row_to_level(row, "")).collect()
    }

    async fn missing_levels(&self, ids: &[i64]) -> Result<Vec<i64>> {
        missing_ids(self.db(), "level_tags", ids).await
    }
}

// Row mappers take a column prefix so joined queries can alias columns
// (`d_id`, `l_title`, ...).

pub(crate) fn row_to_direction(
    row: &sqlx::sqlite::SqliteRow,
    prefix: &str,
) -> Result<TrainingDirection> {
    Ok(TrainingDirection {
        id: row.try_get(format!("{}id", prefix).as_str())?,
        title: row.try_get(format!("{}title", prefix).as_str())?,
        description: row.try_get(format!("{}description", prefix).as_str())?,
        icon: row.try_get(format!("{}icon", prefix).as_str())?,
    })
}

pub(crate) fn row_to_location(row: &sqlx::sqlite::SqliteRow, prefix: &str) -> Result<Location> {
    Ok(Location {
        id: row.try_get(format!("{}id", prefix).as_str())?,
        title: row.try_get(format!("{}title", prefix).as_str())?,
        address: row.try_get(format!("{}address", prefix).as_str())?,
        latitude: row.try_get(format!("{}latitude", prefix).as_str())?,
        longitude: row.try_get(format!("{}longitude", prefix).as_str())?,
    })
}

pub(crate) fn row_to_level(row: &sqlx::sqlite::SqliteRow, prefix: &str) -> Result<LevelTag> {
    let tag: String = row.try_get(format!("{}tag", prefix).as_str())?;
    Ok(LevelTag {
        id: row.try_get(format!("{}id", prefix).as_str())?,
        tag: Level::from_str(&tag)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxCatalogRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxCatalogRepository::new(pool)
    }

    #[tokio::test]
    async fn test_directions_crud() {
        let repo = setup_test_repo().await;
        let run = repo
            .create_direction(&DirectionInput {
                title: "Бег".into(),
                description: String::new(),
                icon: "🏃".into(),
            })
            .await
            .unwrap();
        repo.create_direction(&DirectionInput {
            title: "Велоспорт".into(),
            description: String::new(),
            icon: String::new(),
        })
        .await
        .unwrap();

        let all = repo.list_directions().await.unwrap();
        assert_eq!(all[0].title, "Бег");
        assert_eq!(all.len(), 2);

        let updated = repo
            .update_direction(
                run.id,
                &DirectionInput {
                    title: "Трейл".into(),
                    description: "горы".into(),
                    icon: String::new(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description, "горы");

        assert_eq!(repo.missing_directions(&[run.id, 77]).await.unwrap(), vec![77]);
        assert!(repo.delete_direction(run.id).await.unwrap());
        assert!(repo.get_direction(run.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_location_coordinates_nullable() {
        let repo = setup_test_repo().await;
        let park = repo
            .create_location(&LocationInput {
                title: "Парк".into(),
                address: "ул. Ленина, 1".into(),
                latitude: Some(55.751244),
                longitude: Some(37.618423),
            })
            .await
            .unwrap();
        let gym = repo
            .create_location(&LocationInput {
                title: "Зал".into(),
                address: String::new(),
                latitude: None,
                longitude: None,
            })
            .await
            .unwrap();

        let loaded = repo.get_location(park.id).await.unwrap().unwrap();
        assert_eq!(loaded.latitude, Some(55.751244));
        let loaded = repo.get_location(gym.id).await.unwrap().unwrap();
        assert_eq!(loaded.latitude, None);

        let all = repo.list_locations().await.unwrap();
        assert_eq!(all[0].title, "Зал");
    }

    #[tokio::test]
    async fn test_levels_sorted_by_tag() {
        let repo = setup_test_repo().await;
        let levels = repo.list_levels().await.unwrap();
        let tags: Vec<Level> = levels.iter().map(|l| l.tag).collect();
        assert_eq!(
            tags,
            vec![Level::Advanced, Level::Any, Level::Beginner, Level::Intermediate]
        );
        assert_eq!(repo.missing_levels(&[1, 2, 5]).await.unwrap(), vec![5]);
    }
}
