//! Product scan endpoints

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use crate::error::Error;
use crate::scan::{ProductScan, ScanRepository, ScanRequest, ScanResult};

use super::AppState;
use super::error::ApiError;
use super::extract::AuthUser;

/// POST `/greenlens/scan` - sustainability report for a barcode or product name
pub async fn scan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResult>, ApiError> {
    let Json(request) = payload.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let result = state.scans.scan(&request, &user).await?;
    Ok(Json(result))
}

/// GET `/greenlens/history` - the caller's scans, newest first
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ProductScan>>, ApiError> {
    let scans = ScanRepository::new(&state.db).list_by_owner(user.id).await?;
    Ok(Json(scans))
}
