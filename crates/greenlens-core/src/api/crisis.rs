//! Crisis simulation endpoints

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::crisis::{Simulation, SimulationRepository, StoredSimulation};
use crate::error::Error;

use super::AppState;
use super::error::ApiError;
use super::extract::AuthUser;

/// Body of `POST /crisis/simulate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateRequest {
    pub crisis: String,
}

/// POST `/crisis/simulate` - generate, illustrate and store scenarios for a topic
pub async fn simulate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> Result<Json<Simulation>, ApiError> {
    let Json(body) = payload.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let simulation = state.simulator.simulate(&body.crisis, &user).await?;
    Ok(Json(simulation))
}

/// GET `/crisis/history` - the caller's simulations, newest first
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<StoredSimulation>>, ApiError> {
    let simulations = SimulationRepository::new(&state.db)
        .list_by_owner(user.id)
        .await?;
    Ok(Json(simulations))
}
