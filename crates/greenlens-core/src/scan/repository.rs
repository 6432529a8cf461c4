//! Product scan repository
//!
//! Database operations for `product_scans`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::error::Result;
use crate::storage::Database;

/// A persisted product scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductScan {
    pub id: i64,
    pub barcode: Option<String>,
    pub product_name: Option<String>,
    pub report: String,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Scan repository for database operations
pub struct ScanRepository<'a> {
    db: &'a Database,
}

impl<'a> ScanRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a scan and return its id
    pub async fn insert(
        &self,
        barcode: Option<&str>,
        product_name: Option<&str>,
        report: &str,
        owner_id: i64,
    ) -> Result<i64> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO product_scans (barcode, product_name, report, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(barcode)
        .bind(product_name)
        .bind(report)
        .bind(owner_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        tx.commit().await?;

        Ok(id)
    }

    /// Get a scan by ID
    pub async fn get(&self, id: i64) -> Result<Option<ProductScan>> {
        let row = sqlx::query(
            "SELECT id, barcode, product_name, report, owner_id, created_at FROM product_scans WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_scan))
    }

    /// List a user's scans, newest first
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ProductScan>> {
        let rows = sqlx::query(
            "SELECT id, barcode, product_name, report, owner_id, created_at FROM product_scans WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_scan).collect())
    }
}

fn row_to_scan(row: sqlx::sqlite::SqliteRow) -> ProductScan {
    ProductScan {
        id: row.get("id"),
        barcode: row.get("barcode"),
        product_name: row.get("product_name"),
        report: row.get("report"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    }
}
