//! HTTP API
//!
//! An axum router over the crisis and scan services. Every route except
//! `/health` requires a bearer token.
//!
//! | Method | Path                  | Handler            |
//! |--------|-----------------------|--------------------|
//! | POST   | `/crisis/simulate`    | `crisis::simulate` |
//! | GET    | `/crisis/history`     | `crisis::history`  |
//! | POST   | `/greenlens/scan`     | `scan::scan`       |
//! | GET    | `/greenlens/history`  | `scan::history`    |
//! | GET    | `/health`             | `health::health`   |

pub mod crisis;
pub mod error;
pub mod extract;
pub mod health;
pub mod scan;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::Request;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::auth::{Authenticator, JwtAuthenticator};
use crate::config::Config;
use crate::crisis::CrisisSimulator;
use crate::image::{ImageClient, ImageGenerator};
use crate::llm::{LlmClient, TextGenerator};
use crate::scan::ScanService;
use crate::storage::Database;

pub use error::ApiError;
pub use extract::AuthUser;
pub use health::{HealthCheck, HealthReport, HealthStatus, doctor};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub simulator: CrisisSimulator,
    pub scans: ScanService,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    /// Wire services from explicit collaborators
    pub fn new(
        db: Database,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        authenticator: Arc<dyn Authenticator>,
        config: &Config,
    ) -> Self {
        Self {
            simulator: CrisisSimulator::new(text.clone(), images, db.clone(), &config.crisis),
            scans: ScanService::new(text, db.clone()),
            db,
            authenticator,
        }
    }

    /// Build provider clients and the authenticator from configuration
    pub fn from_config(config: &Config, db: Database) -> crate::Result<Self> {
        let text: Arc<dyn TextGenerator> = Arc::new(LlmClient::from_config(&config.llm)?);
        let images: Arc<dyn ImageGenerator> = Arc::new(ImageClient::from_config(&config.image)?);
        let authenticator: Arc<dyn Authenticator> =
            Arc::new(JwtAuthenticator::from_config(&config.auth)?);
        Ok(Self::new(db, text, images, authenticator, config))
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/crisis/simulate", post(crisis::simulate))
        .route("/crisis/history", get(crisis::history))
        .route("/greenlens/scan", post(scan::scan))
        .route("/greenlens/history", get(scan::history))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %Uuid::new_v4(),
            )
        }))
        .with_state(state)
}

/// Open the database, wire services and serve until Ctrl-C
pub async fn serve(config: &Config, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    let addr = match bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind: {}", config.server.bind))?,
    };

    let db = Database::open(config).await?;
    let state = AppState::from_config(config, db.clone())?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, database = %db.path().display(), "GreenLens listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("GreenLens stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
