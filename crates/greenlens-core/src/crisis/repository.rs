//! Simulation repository
//!
//! Database operations for `crisis_sims`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::error::{Error, Result};
use crate::storage::Database;

use super::scenario::Scenarios;

/// A persisted simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSimulation {
    pub id: i64,
    pub crisis: String,
    pub scenarios: Scenarios,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Simulation repository for database operations
pub struct SimulationRepository<'a> {
    db: &'a Database,
}

impl<'a> SimulationRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a simulation in its own transaction and return its id
    pub async fn insert(&self, crisis: &str, scenarios: &Scenarios, owner_id: i64) -> Result<i64> {
        let scenarios_json = serde_json::to_string(scenarios)
            .map_err(|e| Error::Other(format!("Failed to encode scenarios: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO crisis_sims (crisis, scenarios, owner_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(crisis)
        .bind(&scenarios_json)
        .bind(owner_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        tx.commit().await?;

        Ok(id)
    }

    /// Get a simulation by ID
    pub async fn get(&self, id: i64) -> Result<Option<StoredSimulation>> {
        let row = sqlx::query(
            "SELECT id, crisis, scenarios, owner_id, created_at FROM crisis_sims WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_simulation).transpose()
    }

    /// List a user's simulations, newest first
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<StoredSimulation>> {
        let rows = sqlx::query(
            "SELECT id, crisis, scenarios, owner_id, created_at FROM crisis_sims WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_simulation).collect()
    }

    /// Count a user's simulations
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM crisis_sims WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

fn row_to_simulation(row: sqlx::sqlite::SqliteRow) -> Result<StoredSimulation> {
    let id: i64 = row.get("id");
    let scenarios_json: String = row.get("scenarios");
    let scenarios = serde_json::from_str(&scenarios_json)
        .map_err(|e| Error::CorruptRecord(format!("crisis_sims {}: {}", id, e)))?;

    Ok(StoredSimulation {
        id,
        crisis: row.get("crisis"),
        scenarios,
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    })
}
