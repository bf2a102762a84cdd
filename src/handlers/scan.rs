use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::{
    db,
    error::{AppError, AppResult},
    models::{ScanRequest, ScanResponse},
    AppState,
};

// ── POST /api/scan ────────────────────────────────────────────────────────────

pub async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ScanResponse>)> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let (tag, action) = request.validate().map_err(|msg| {
        warn!(reason = %msg, "Rejected scan");
        AppError::BadRequest(msg)
    })?;

    let new_quantity = db::apply_scan(&state.db, &tag, action).await?;

    info!(tag = %tag, action = %action, new_quantity, "Applied scan");

    Ok((StatusCode::OK, Json(ScanResponse::updated(new_quantity))))
}
