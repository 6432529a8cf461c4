//! Storage layer - SQLite
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! Repositories for simulations and scans live next to the services that
//! write them (`crisis::repository`, `scan::repository`).
//!
//! # Usage
//!
//! ```ignore
//! use greenlens_core::storage::Database;
//!
//! // In-memory database for tests
//! let db = Database::in_memory().await?;
//!
//! // Or the configured file database
//! let db = Database::open(&config).await?;
//! ```

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
