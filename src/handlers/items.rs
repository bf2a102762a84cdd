use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    db,
    error::{AppError, AppResult},
    models::{Item, LowStockParams, UpdateQuantity, DEFAULT_LOW_STOCK_THRESHOLD},
    AppState,
};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_items(State(state): State<AppState>) -> AppResult<(StatusCode, Json<Vec<Item>>)> {
    let start = Instant::now();
    let items = db::fetch_all_items(&state.db).await?;

    info!(
        count = items.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Listed items"
    );

    Ok((StatusCode::OK, Json(items)))
}

// ── Get by tag ────────────────────────────────────────────────────────────────

pub async fn get_item(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = db::fetch_item_by_tag(&state.db, &tag).await?;
    Ok((StatusCode::OK, Json(item)))
}

// ── Low stock ─────────────────────────────────────────────────────────────────

pub async fn list_low_stock(
    State(state): State<AppState>,
    params: Result<Query<LowStockParams>, QueryRejection>,
) -> AppResult<(StatusCode, Json<Vec<Item>>)> {
    let Query(params) = params.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let threshold = params.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    if threshold < 0 {
        return Err(AppError::BadRequest("threshold must be >= 0".to_string()));
    }

    let items = db::fetch_low_stock_items(&state.db, threshold).await?;
    info!(threshold, count = items.len(), "Listed low-stock items");

    Ok((StatusCode::OK, Json(items)))
}

// ── Stock correction ──────────────────────────────────────────────────────────

pub async fn set_item_quantity(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    payload: Result<Json<UpdateQuantity>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let touched = db::set_quantity(&state.db, &tag, payload.quantity).await?;
    if touched == 0 {
        return Err(AppError::NotFound(format!("Item with tag {} not found", tag)));
    }

    let item = db::fetch_item_by_tag(&state.db, &tag).await?;
    info!(tag = %tag, quantity = item.quantity, "Set item quantity");

    Ok((StatusCode::OK, Json(item)))
}
