//! SQLite database operations
//!
//! Provides connection pool management and database initialization.

use crate::config::Config;
use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default maximum connections in the pool
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const MEMORY_PATH: &str = ":memory:";

/// Database configuration options
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Whether to run migrations automatically
    pub auto_migrate: bool,
    /// Journal mode (default: WAL)
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode (default: NORMAL)
    pub synchronous: SqliteSynchronous,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the specified path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Build a database config from the `server` section of the application config
    pub fn from_config(config: &Config) -> Self {
        Self::with_path(config.database_path()).max_connections(config.server.max_connections)
    }

    /// Create a config for an in-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            // every connection to :memory: opens a separate database
            max_connections: 1,
            ..Default::default()
        }
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Disable automatic migrations
    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

/// Get the default database path
pub fn default_database_path() -> PathBuf {
    match dirs::data_dir().or_else(dirs::config_dir) {
        Some(dir) => dir.join("greenlens").join("greenlens.db"),
        None => PathBuf::from("greenlens.db"),
    }
}

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Create a new database connection with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        if !config.is_memory() {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }

        let connection_str = if config.is_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", config.path.display())
        };

        let connect_options = SqliteConnectOptions::from_str(&connection_str)?
            .journal_mode(config.journal_mode)
            .synchronous(config.synchronous)
            .foreign_keys(true)
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_memory() {
            // the schema lives only as long as its connection
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database: {:?}", config.path))?;

        let db = Self {
            pool,
            config: config.clone(),
        };

        if config.auto_migrate {
            db.migrate().await?;
        }

        Ok(db)
    }

    /// Open the database described by the application config
    pub async fn open(config: &Config) -> Result<Self> {
        Self::new(DatabaseConfig::from_config(config)).await
    }

    /// Create an in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Begin a transaction scoped to one unit of work
    ///
    /// The transaction rolls back when dropped without `commit`.
    pub async fn begin(&self) -> crate::Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::in_memory().await.expect("Failed to create in-memory database");

        db.health_check().await.expect("Health check failed");

        let status = db.migration_status().await.expect("Failed to get migration status");
        assert!(!status.needs_migration);
    }

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::with_path("/tmp/test.db")
            .max_connections(10)
            .no_migrate();

        assert_eq!(config.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.max_connections, 10);
        assert!(!config.auto_migrate);
        assert!(!config.is_memory());
        assert!(DatabaseConfig::in_memory().is_memory());
    }

    #[test]
    fn test_config_from_app_config() {
        let mut app = Config::default();
        app.server.database_path = Some(PathBuf::from("/srv/greenlens/app.db"));
        app.server.max_connections = 3;

        let config = DatabaseConfig::from_config(&app);
        assert_eq!(config.path, PathBuf::from("/srv/greenlens/app.db"));
        assert_eq!(config.max_connections, 3);
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path();
        assert!(path.ends_with("greenlens.db"));
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::in_memory().await.expect("Failed to create database");

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("Failed to check foreign_keys pragma");

        assert_eq!(result.0, 1, "Foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("greenlens.db");

        {
            let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
            sqlx::query("INSERT INTO crisis_sims (crisis, scenarios, owner_id) VALUES (?, ?, ?)")
                .bind("drought")
                .bind("{}")
                .bind(1_i64)
                .execute(db.pool())
                .await
                .unwrap();
            db.close().await;
        }

        let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM crisis_sims")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = Database::in_memory().await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            sqlx::query("INSERT INTO crisis_sims (crisis, scenarios, owner_id) VALUES ('x', '{}', 1)")
                .execute(&mut *tx)
                .await
                .unwrap();
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM crisis_sims")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
