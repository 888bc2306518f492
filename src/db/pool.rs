//! Database connection pool abstraction
//!
//! Repositories talk to the database through the `DatabasePool` trait so the
//! storage backend stays behind one seam. The shipped backend is SQLite.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::DatabaseConfig;

/// Database pool trait that abstracts over the storage backend.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL statement that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Check if the database connection is healthy
    async fn ping(&self) -> Result<()>;

    /// Close the connection pool
    async fn close(&self);

    /// Get the underlying SQLite pool
    fn sqlite(&self) -> &SqlitePool;
}

/// SQLite connection pool implementation
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Create a new SQLite connection pool
    ///
    /// Accepts a plain file path, a `sqlite:` URL or `:memory:`.
    pub async fn new(url: &str) -> Result<Self> {
        let in_memory = is_memory_url(url);

        if !in_memory {
            let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path = path.split('?').next().unwrap_or(path);

            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
        }

        let connection_url = if in_memory {
            "sqlite::memory:".to_string()
        } else if url.starts_with("sqlite:") {
            url.to_string()
        } else {
            format!("sqlite:{}", url)
        };

        let options = SqliteConnectOptions::from_str(&connection_url)
            .with_context(|| format!("Invalid SQLite URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every in-memory connection is its own database, so keep exactly one
        // and never recycle it.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(20)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn sqlite(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Type alias for a shared database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Create a database connection pool based on configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let db = SqliteDatabase::new(&config.url).await?;
    Ok(Arc::new(db))
}

/// Create an in-memory SQLite pool for testing.
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let db = SqliteDatabase::new(":memory:").await?;
    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        pool.ping().await.expect("Ping failed");
    }

    #[tokio::test]
    async fn test_memory_pool_shares_one_database() {
        let pool = create_test_pool().await.unwrap();
        pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)").await.unwrap();
        pool.execute("INSERT INTO t (id) VALUES (1)").await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(pool.sqlite())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gabi.db");

        let config = DatabaseConfig {
            url: path.display().to_string(),
        };
        let pool = create_pool(&config).await.expect("Failed to create file pool");
        pool.ping().await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }

    #[test]
    fn test_is_memory_url() {
        assert!(is_memory_url(":memory:"));
        assert!(is_memory_url("sqlite::memory:"));
        assert!(!is_memory_url("data/gabi.db"));
        assert!(!is_memory_url("sqlite:data/gabi.db"));
    }
}
