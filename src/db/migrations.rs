//! Database migrations module
//!
//! All migrations are embedded directly in Rust code as SQL strings so the
//! binary can create and upgrade its own schema.
//!
//! # Usage
//!
//! ```ignore
//! use gabi::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Each migration is a `Migration` with a unique `version`, a readable `name`
//! and the `up` SQL (several statements separated by `;`). Applied versions
//! are tracked in the `_migrations` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::DynDatabasePool;

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements
    pub up: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'editor',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_blog",
        up: r#"
            CREATE TABLE IF NOT EXISTS article_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(60) NOT NULL UNIQUE,
                slug VARCHAR(80) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(240) NOT NULL UNIQUE,
                excerpt TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                cover_image VARCHAR(255) NOT NULL DEFAULT '',
                header_image VARCHAR(255) NOT NULL DEFAULT '',
                published_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT 1,
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                seo_title VARCHAR(200) NOT NULL DEFAULT '',
                seo_description TEXT NOT NULL DEFAULT '',
                reading_time INTEGER NOT NULL DEFAULT 5
            );
            CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at);
            CREATE TABLE IF NOT EXISTS article_tag_links (
                article_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, tag_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES article_tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_article_tag_links_tag ON article_tag_links(tag_id);
            CREATE TABLE IF NOT EXISTS article_sections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                title VARCHAR(160) NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS article_gallery_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                image VARCHAR(255) NOT NULL,
                caption VARCHAR(200) NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_trainings",
        up: r#"
            CREATE TABLE IF NOT EXISTS training_directions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(100) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                icon VARCHAR(120) NOT NULL DEFAULT ''
            );
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(120) NOT NULL,
                address VARCHAR(255) NOT NULL DEFAULT '',
                latitude REAL,
                longitude REAL
            );
            CREATE TABLE IF NOT EXISTS level_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag VARCHAR(20) NOT NULL UNIQUE
            );
            INSERT OR IGNORE INTO level_tags (tag) VALUES ('beginner');
            INSERT OR IGNORE INTO level_tags (tag) VALUES ('intermediate');
            INSERT OR IGNORE INTO level_tags (tag) VALUES ('advanced');
            INSERT OR IGNORE INTO level_tags (tag) VALUES ('any');
            CREATE TABLE IF NOT EXISTS coaches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name VARCHAR(120) NOT NULL,
                slug VARCHAR(140) NOT NULL UNIQUE,
                role VARCHAR(120) NOT NULL DEFAULT '',
                bio TEXT NOT NULL DEFAULT '',
                achievements TEXT NOT NULL DEFAULT '',
                experience_years INTEGER NOT NULL DEFAULT 0,
                photo VARCHAR(255) NOT NULL DEFAULT '',
                instagram VARCHAR(255) NOT NULL DEFAULT '',
                telegram VARCHAR(255) NOT NULL DEFAULT '',
                phone VARCHAR(30) NOT NULL DEFAULT '',
                email VARCHAR(254) NOT NULL DEFAULT '',
                is_featured BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS coach_directions (
                coach_id INTEGER NOT NULL,
                direction_id INTEGER NOT NULL,
                PRIMARY KEY (coach_id, direction_id),
                FOREIGN KEY (coach_id) REFERENCES coaches(id) ON DELETE CASCADE,
                FOREIGN KEY (direction_id) REFERENCES training_directions(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS training_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(160) NOT NULL,
                category VARCHAR(20) NOT NULL DEFAULT '',
                icon VARCHAR(120) NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                price INTEGER NOT NULL DEFAULT 0,
                period VARCHAR(80) NOT NULL DEFAULT '',
                buy_link VARCHAR(255) NOT NULL DEFAULT '',
                buy_label VARCHAR(60) NOT NULL DEFAULT 'Приобрести',
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS training_plan_benefits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plan_id INTEGER NOT NULL,
                text VARCHAR(200) NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (plan_id) REFERENCES training_plans(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS session_tariffs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(160) NOT NULL,
                category VARCHAR(20) NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS session_tariff_prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tariff_id INTEGER NOT NULL,
                label VARCHAR(120) NOT NULL,
                price INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (tariff_id) REFERENCES session_tariffs(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS training_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(160) NOT NULL DEFAULT '',
                date DATE NOT NULL,
                start_time TIME NOT NULL,
                end_time TIME NOT NULL,
                type VARCHAR(20) NOT NULL DEFAULT 'group',
                direction_id INTEGER NOT NULL,
                coach_id INTEGER,
                location_id INTEGER NOT NULL,
                intensity VARCHAR(60) NOT NULL DEFAULT '',
                spots_total INTEGER NOT NULL DEFAULT 0,
                spots_available INTEGER NOT NULL DEFAULT 0,
                description TEXT NOT NULL DEFAULT '',
                registration_link VARCHAR(255) NOT NULL DEFAULT '',
                color VARCHAR(20) NOT NULL DEFAULT '#006CFF',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (direction_id) REFERENCES training_directions(id) ON DELETE CASCADE,
                FOREIGN KEY (coach_id) REFERENCES coaches(id) ON DELETE SET NULL,
                FOREIGN KEY (location_id) REFERENCES locations(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_training_sessions_date ON training_sessions(date, start_time);
            CREATE TABLE IF NOT EXISTS training_session_levels (
                session_id INTEGER NOT NULL,
                level_id INTEGER NOT NULL,
                PRIMARY KEY (session_id, level_id),
                FOREIGN KEY (session_id) REFERENCES training_sessions(id) ON DELETE CASCADE,
                FOREIGN KEY (level_id) REFERENCES level_tags(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS session_attachments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                title VARCHAR(160) NOT NULL,
                file VARCHAR(255) NOT NULL DEFAULT '',
                FOREIGN KEY (session_id) REFERENCES training_sessions(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_camps",
        up: r#"
            CREATE TABLE IF NOT EXISTS camps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(220) NOT NULL UNIQUE,
                summary TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                price_from INTEGER NOT NULL DEFAULT 0,
                location VARCHAR(255) NOT NULL,
                hero_image VARCHAR(255) NOT NULL DEFAULT '',
                header_image VARCHAR(255) NOT NULL DEFAULT '',
                registration_link VARCHAR(255) NOT NULL DEFAULT '',
                status VARCHAR(12) NOT NULL DEFAULT 'upcoming',
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                logistics TEXT NOT NULL DEFAULT '',
                target_audience TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_camps_start_date ON camps(start_date);
            CREATE TABLE IF NOT EXISTS camp_highlights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                camp_id INTEGER NOT NULL,
                text VARCHAR(200) NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (camp_id) REFERENCES camps(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS camp_days (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                camp_id INTEGER NOT NULL,
                day_number INTEGER NOT NULL DEFAULT 1,
                title VARCHAR(120) NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (camp_id) REFERENCES camps(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS camp_gallery_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                camp_id INTEGER NOT NULL,
                image VARCHAR(255) NOT NULL,
                caption VARCHAR(150) NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (camp_id) REFERENCES camps(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS camp_inclusions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                camp_id INTEGER NOT NULL,
                text VARCHAR(200) NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (camp_id) REFERENCES camps(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS camp_trainers (
                camp_id INTEGER NOT NULL,
                coach_id INTEGER NOT NULL,
                PRIMARY KEY (camp_id, coach_id),
                FOREIGN KEY (camp_id) REFERENCES camps(id) ON DELETE CASCADE,
                FOREIGN KEY (coach_id) REFERENCES coaches(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 6,
        name: "create_core",
        up: r#"
            CREATE TABLE IF NOT EXISTS contact_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(120) NOT NULL DEFAULT 'Gabi Club',
                phone_primary VARCHAR(30) NOT NULL DEFAULT '',
                phone_secondary VARCHAR(30) NOT NULL DEFAULT '',
                email VARCHAR(254) NOT NULL DEFAULT '',
                address VARCHAR(255) NOT NULL DEFAULT '',
                map_url VARCHAR(255) NOT NULL DEFAULT '',
                working_hours VARCHAR(150) NOT NULL DEFAULT '',
                whatsapp VARCHAR(120) NOT NULL DEFAULT '',
                telegram VARCHAR(120) NOT NULL DEFAULT '',
                instagram VARCHAR(120) NOT NULL DEFAULT '',
                youtube VARCHAR(120) NOT NULL DEFAULT '',
                vk VARCHAR(120) NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS social_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL,
                title VARCHAR(60) NOT NULL,
                url VARCHAR(255) NOT NULL,
                icon VARCHAR(60) NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (contact_id) REFERENCES contact_info(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS club_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(160) NOT NULL DEFAULT 'Gabi Club',
                tagline VARCHAR(200) NOT NULL DEFAULT '',
                mission TEXT NOT NULL DEFAULT '',
                story TEXT NOT NULL DEFAULT '',
                founded_year INTEGER,
                hero_video VARCHAR(255) NOT NULL DEFAULT '',
                hero_description TEXT NOT NULL DEFAULT '',
                seo_title VARCHAR(200) NOT NULL DEFAULT '',
                seo_description TEXT NOT NULL DEFAULT '',
                updated_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS hero_slides (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id INTEGER NOT NULL,
                title VARCHAR(120) NOT NULL DEFAULT '',
                subtitle VARCHAR(200) NOT NULL DEFAULT '',
                image VARCHAR(255) NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (profile_id) REFERENCES club_profiles(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS lead_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name VARCHAR(120) NOT NULL,
                email VARCHAR(254) NOT NULL DEFAULT '',
                phone VARCHAR(30) NOT NULL DEFAULT '',
                preferred_direction VARCHAR(120) NOT NULL DEFAULT '',
                message TEXT NOT NULL DEFAULT '',
                source VARCHAR(60) NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_lead_requests_created_at ON lead_requests(created_at);
        "#,
    },
];

/// Run all pending database migrations.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool.sqlite()).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool.sqlite(), migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;
    Ok(())
}

async fn get_applied_migrations(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(MigrationRecord {
            version: row.try_get("version")?,
            name: row.try_get("name")?,
            applied_at: row.try_get("applied_at")?,
        });
    }

    Ok(records)
}

/// Apply a single migration inside a transaction
async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;

    for statement in split_sql_statements(migration.up) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool.sqlite()).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");
        assert!(is_up_to_date(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_levels_are_seeded() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tags: Vec<String> = sqlx::query_scalar("SELECT tag FROM level_tags ORDER BY id")
            .fetch_all(pool.sqlite())
            .await
            .unwrap();
        assert_eq!(tags, vec!["beginner", "intermediate", "advanced", "any"]);
    }

    #[tokio::test]
    async fn test_article_delete_cascades_to_children() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let db = pool.sqlite();

        sqlx::query(
            "INSERT INTO articles (title, slug, published_at, updated_at) VALUES ('A', 'a', ?, ?)",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(db)
        .await
        .unwrap();
        sqlx::query("INSERT INTO article_sections (article_id, title) VALUES (1, 'intro')")
            .execute(db)
            .await
            .unwrap();
        sqlx::query("DELETE FROM articles WHERE id = 1").execute(db).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article_sections")
            .fetch_one(db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n-- just a comment\n;\nINSERT INTO a VALUES (1);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "INSERT INTO a VALUES (1)"]);
    }

    #[test]
    fn test_truncate_sql_handles_multibyte() {
        let sql = "ы".repeat(150);
        let truncated = truncate_sql(&sql);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 103);
    }
}
