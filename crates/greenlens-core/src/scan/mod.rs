//! Product sustainability scans
//!
//! A scan takes a barcode or a product name, asks the text provider for a
//! short environmental-risk report with three greener alternatives, and
//! stores the report for the requesting user.

pub mod repository;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::User;
use crate::error::{Error, Result};
use crate::llm::TextGenerator;
use crate::storage::Database;

pub use repository::{ProductScan, ScanRepository};

/// Request body for a scan; at least one field must be non-blank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
}

impl ScanRequest {
    pub fn barcode(barcode: impl Into<String>) -> Self {
        Self {
            barcode: Some(barcode.into()),
            product_name: None,
        }
    }

    pub fn product_name(name: impl Into<String>) -> Self {
        Self {
            barcode: None,
            product_name: Some(name.into()),
        }
    }

    /// Trim both fields, treating blank values as absent
    fn normalized(&self) -> (Option<&str>, Option<&str>) {
        fn clean(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }
        (clean(&self.barcode), clean(&self.product_name))
    }
}

/// A completed, persisted scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub scan_id: i64,
    pub report: String,
}

/// Generates and stores product sustainability reports
#[derive(Clone)]
pub struct ScanService {
    generator: Arc<dyn TextGenerator>,
    db: Database,
}

impl std::fmt::Debug for ScanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanService").finish_non_exhaustive()
    }
}

impl ScanService {
    pub fn new(generator: Arc<dyn TextGenerator>, db: Database) -> Self {
        Self { generator, db }
    }

    /// Generate a report for the product and store it for `user`
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn scan(&self, request: &ScanRequest, user: &User) -> Result<ScanResult> {
        let (barcode, product_name) = request.normalized();
        let product = barcode.or(product_name).ok_or_else(|| {
            Error::InvalidInput("barcode or product_name is required".to_string())
        })?;

        let report = self.generator.generate_text(&report_prompt(product)).await?.text;

        let scan_id = ScanRepository::new(&self.db)
            .insert(barcode, product_name, &report, user.id)
            .await?;

        info!(scan_id, "Product scan completed");

        Ok(ScanResult { scan_id, report })
    }
}

/// Prompt for a product's sustainability report
pub fn report_prompt(product: &str) -> String {
    format!(
        "Product: {product}\n\
         Summarize PFAS, palm oil, carbon footprint and other environmental risks \
         as short bullet points. Then give the user 3 suggestions for more \
         sustainable alternatives."
    )
}
