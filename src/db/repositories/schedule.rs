//! Schedule repository
//!
//! Training sessions joined with their direction and location. Coaches,
//! levels and attachments are loaded in batches after the main query.

use crate::db::DynDatabasePool;
use crate::models::{
    LevelTag, SessionAttachment, SessionFilter, SessionInput, TrainingSession,
    TrainingType,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use super::catalog::{row_to_direction, row_to_level, row_to_location};
use super::coach::load_coaches;
use super::{count_rows, push_id_list};

/// Schedule repository trait
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Sessions matching the filter, ordered by date and start time
    async fn list(&self, filter: &SessionFilter) -> Result<Vec<TrainingSession>>;

    /// Get one session, optionally only if it matches `filter`
    async fn get(&self, id: i64, filter: Option<&SessionFilter>)
        -> Result<Option<TrainingSession>>;

    async fn create(&self, input: &SessionInput) -> Result<TrainingSession>;

    async fn update(&self, id: i64, input: &SessionInput) -> Result<Option<TrainingSession>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based schedule repository implementation
pub struct SqlxScheduleRepository {
    pool: DynDatabasePool,
}

impl SqlxScheduleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ScheduleRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }

    async fn query(&self, filter: &SessionFilter, id: Option<i64>) -> Result<Vec<TrainingSession>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SESSION_SELECT);

        if let Some(id) = id {
            qb.push(" AND s.id = ").push_bind(id);
        }
        if let Some(session_type) = filter.session_type {
            qb.push(" AND s.type = ").push_bind(session_type.as_str());
        }
        if let Some(direction_id) = filter.direction_id {
            qb.push(" AND s.direction_id = ").push_bind(direction_id);
        }
        if let Some(coach_id) = filter.coach_id {
            qb.push(" AND s.coach_id = ").push_bind(coach_id);
        }
        if let Some(location_id) = filter.location_id {
            qb.push(" AND s.location_id = ").push_bind(location_id);
        }
        if let Some(level) = filter.level {
            qb.push(
                " AND EXISTS (SELECT 1 FROM training_session_levels sl \
                 JOIN level_tags lt ON lt.id = sl.level_id \
                 WHERE sl.session_id = s.id AND lt.tag = ",
            )
            .push_bind(level.as_str())
            .push(")");
        }
        if let Some(from) = filter.window.from {
            qb.push(" AND s.date >= ").push_bind(from);
        }
        if let Some(to) = filter.window.to {
            qb.push(" AND s.date <= ").push_bind(to);
        }
        qb.push(" ORDER BY s.date, s.start_time, s.id");

        let rows = qb
            .build()
            .fetch_all(self.db())
            .await
            .context("Failed to query training sessions")?;

        let mut sessions = Vec::with_capacity(rows.len());
        let mut coach_ids: Vec<(usize, i64)> = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            sessions.push(row_to_session(row)?);
            if let Some(coach_id) = row.try_get::<Option<i64>, _>("coach_id")? {
                coach_ids.push((index, coach_id));
            }
        }

        let ids: Vec<i64> = coach_ids.iter().map(|(_, id)| *id).collect();
        let coaches = load_coaches(self.db(), &ids).await?;
        for (index, coach_id) in coach_ids {
            sessions[index].coach = coaches.get(&coach_id).cloned();
        }

        let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let mut levels = load_levels(self.db(), &session_ids).await?;
        let mut attachments = load_attachments(self.db(), &session_ids).await?;
        for session in &mut sessions {
            session.levels = levels.remove(&session.id).unwrap_or_default();
            session.attachments = attachments.remove(&session.id).unwrap_or_default();
        }

        Ok(sessions)
    }
}

const SESSION_SELECT: &str = "SELECT s.id, s.title, s.date, s.start_time, s.end_time, s.type, \
     s.coach_id, s.intensity, s.spots_total, s.spots_available, s.description, \
     s.registration_link, s.color, s.created_at, s.updated_at, \
     d.id AS d_id, d.title AS d_title, d.description AS d_description, d.icon AS d_icon, \
     l.id AS l_id, l.title AS l_title, l.address AS l_address, \
     l.latitude AS l_latitude, l.longitude AS l_longitude \
     FROM training_sessions s \
     JOIN training_directions d ON d.id = s.direction_id \
     JOIN locations l ON l.id = s.location_id \
     WHERE 1 = 1";

#[async_trait]
impl ScheduleRepository for SqlxScheduleRepository {
    async fn list(&self, filter: &SessionFilter) -> Result<Vec<TrainingSession>> {
        self.query(filter, None).await
    }

    async fn get(
        &self,
        id: i64,
        filter: Option<&SessionFilter>,
    ) -> Result<Option<TrainingSession>> {
        let any = SessionFilter::default();
        let filter = filter.unwrap_or(&any);
        Ok(self.query(filter, Some(id)).await?.into_iter().next())
    }

    async fn create(&self, input: &SessionInput) -> Result<TrainingSession> {
        let now = Utc::now();
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO training_sessions (title, date, start_time, end_time, type,
                direction_id, coach_id, location_id, intensity, spots_total, spots_available,
                description, registration_link, color, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(input.date)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.session_type.as_str())
        .bind(input.direction_id)
        .bind(input.coach_id)
        .bind(input.location_id)
        .bind(&input.intensity)
        .bind(input.spots_total)
        .bind(input.spots_available)
        .bind(&input.description)
        .bind(&input.registration_link)
        .bind(&input.color)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create training session")?;

        let id = result.last_insert_rowid();
        write_children(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get(id, None)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Training session not found after insert"))
    }

    async fn update(&self, id: i64, input: &SessionInput) -> Result<Option<TrainingSession>> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE training_sessions
            SET title = ?, date = ?, start_time = ?, end_time = ?, type = ?, direction_id = ?,
                coach_id = ?, location_id = ?, intensity = ?, spots_total = ?,
                spots_available = ?, description = ?, registration_link = ?, color = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(input.date)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.session_type.as_str())
        .bind(input.direction_id)
        .bind(input.coach_id)
        .bind(input.location_id)
        .bind(&input.intensity)
        .bind(input.spots_total)
        .bind(input.spots_available)
        .bind(&input.description)
        .bind(&input.registration_link)
        .bind(&input.color)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update training session")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        for table in ["training_session_levels", "session_attachments"] {
            sqlx::query(&format!("DELETE FROM {} WHERE session_id = ?", table))
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear {}", table))?;
        }
        write_children(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get(id, None).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM training_sessions WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete training session")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        count_rows(self.db(), "training_sessions").await
    }
}

async fn write_children(conn: &mut SqliteConnection, id: i64, input: &SessionInput) -> Result<()> {
    for level_id in &input.level_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO training_session_levels (session_id, level_id) VALUES (?, ?)",
        )
        .bind(id)
        .bind(*level_id)
        .execute(&mut *conn)
        .await
        .context("Failed to link session level")?;
    }

    for attachment in &input.attachments {
        sqlx::query("INSERT INTO session_attachments (session_id, title, file) VALUES (?, ?, ?)")
            .bind(id)
            .bind(&attachment.title)
            .bind(&attachment.file)
            .execute(&mut *conn)
            .await
            .context("Failed to insert session attachment")?;
    }

    Ok(())
}

async fn load_levels(db: &SqlitePool, session_ids: &[i64]) -> Result<HashMap<i64, Vec<LevelTag>>> {
    let mut map: HashMap<i64, Vec<LevelTag>> = HashMap::new();
    if session_ids.is_empty() {
        return Ok(map);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT sl.session_id, lt.id, lt.tag FROM training_session_levels sl \
         JOIN level_tags lt ON lt.id = sl.level_id WHERE sl.session_id",
    );
    push_id_list(&mut qb, session_ids);
    qb.push(" ORDER BY lt.tag");

    let rows = qb
        .build()
        .fetch_all(db)
        .await
        .context("Failed to load session levels")?;

    for row in rows {
        let session_id: i64 = row.try_get("session_id")?;
        map.entry(session_id).or_default().push(row_to_level(&row, "")?);
    }
    Ok(map)
}

async fn load_attachments(
    db: &SqlitePool,
    session_ids: &[i64],
) -> Result<HashMap<i64, Vec<SessionAttachment>>> {
    let mut map: HashMap<i64, Vec<SessionAttachment>> = HashMap::new();
    if session_ids.is_empty() {
        return Ok(map);
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT session_id, id, title, file FROM session_attachments WHERE session_id");
    push_id_list(&mut qb, session_ids);
    qb.push(" ORDER BY id");

    let rows = qb
        .build()
        .fetch_all(db)
        .await
        .context("Failed to load session attachments")?;

    for row in rows {
        let session_id: i64 = row.try_get("session_id")?;
        map.entry(session_id).or_default().push(SessionAttachment {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            file: row.try_get("file")?,
        });
    }
    Ok(map)
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<TrainingSession> {
    let session_type: String = row.try_get("type")?;

    Ok(TrainingSession {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        date: row.try_get("date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        session_type: TrainingType::from_str(&session_type).unwrap_or_default(),
        direction: row_to_direction(row, "d_")?,
        coach: None,
        location: row_to_location(row, "l_")?,
        levels: Vec::new(),
        intensity: row.try_get("intensity")?,
        spots_total: row.try_get("spots_total")?,
        spots_available: row.try_get("spots_available")?,
        description: row.try_get("description")?,
        registration_link: row.try_get("registration_link")?,
        color: row.try_get("color")?,
        attachments: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
