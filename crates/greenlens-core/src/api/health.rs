//! Health checks
//!
//! `GET /health` reports liveness and database reachability. `doctor` runs
//! the fuller set of checks behind `greenlens doctor`.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::{Config, IMAGE_API_KEY_VAR, JWT_SECRET_VAR, LLM_API_KEY_VAR};
use crate::storage::Database;

use super::AppState;

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message.into()),
        }
    }
}

/// Health status, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Warning,
    Error,
}

/// Overall health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub version: String,
    pub checks: Vec<HealthCheck>,
    pub timestamp: String,
}

impl HealthReport {
    fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Ok);
        Self {
            overall_status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// GET `/health` - liveness plus database check
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = HealthReport::from_checks(vec![check_database(&state.db).await]);
    let status = match report.overall_status {
        HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(report))
}

/// Run all checks for `greenlens doctor`
pub async fn doctor(config: &Config) -> HealthReport {
    let mut checks = vec![check_config(config)];

    match Database::open(config).await {
        Ok(db) => {
            checks.push(check_database(&db).await);
            db.close().await;
        }
        Err(e) => checks.push(HealthCheck::new(
            "Database",
            HealthStatus::Error,
            format!("Cannot open {}: {:#}", config.database_path().display(), e),
        )),
    }

    checks.push(check_secret(
        "Text provider key",
        LLM_API_KEY_VAR,
        config.llm.resolved_api_key(),
    ));
    checks.push(check_secret(
        "Image provider key",
        IMAGE_API_KEY_VAR,
        config.image.resolved_api_key(),
    ));
    checks.push(check_secret(
        "Token secret",
        JWT_SECRET_VAR,
        config.auth.resolved_secret(),
    ));

    HealthReport::from_checks(checks)
}

async fn check_database(db: &Database) -> HealthCheck {
    if let Err(e) = db.health_check().await {
        return HealthCheck::new("Database", HealthStatus::Error, format!("{:#}", e));
    }

    match db.migration_status().await {
        Ok(status) if status.needs_migration => HealthCheck::new(
            "Database",
            HealthStatus::Warning,
            format!(
                "Schema at v{}, latest is v{}",
                status.current_version, status.target_version
            ),
        ),
        Ok(status) => HealthCheck::new(
            "Database",
            HealthStatus::Ok,
            format!("Connected, schema v{}", status.current_version),
        ),
        Err(e) => HealthCheck::new("Database", HealthStatus::Error, format!("{:#}", e)),
    }
}

fn check_config(config: &Config) -> HealthCheck {
    if let Err(e) = config.validate() {
        return HealthCheck::new("Configuration", HealthStatus::Error, format!("{:#}", e));
    }

    match Config::config_path() {
        Ok(path) if path.exists() => HealthCheck::new(
            "Configuration",
            HealthStatus::Ok,
            format!("Found at {}", path.display()),
        ),
        Ok(path) => HealthCheck::new(
            "Configuration",
            HealthStatus::Ok,
            format!("Not found at {} (using defaults)", path.display()),
        ),
        Err(e) => HealthCheck::new("Configuration", HealthStatus::Warning, format!("{:#}", e)),
    }
}

fn check_secret(name: &str, var: &str, resolved: Option<String>) -> HealthCheck {
    match resolved {
        Some(_) => HealthCheck::new(name, HealthStatus::Ok, format!("{} is set", var)),
        None => HealthCheck::new(
            name,
            HealthStatus::Error,
            format!("{} is not set; the server will not start", var),
        ),
    }
}
