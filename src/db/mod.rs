use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::seed;

// ── Pool / schema ─────────────────────────────────────────────────────────────

/// Open the shared pool, creating the database file if it does not exist yet.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid DATABASE_URL {database_url:?}"))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open SQLite database at {database_url:?}"))
}

/// Create the `items` table when absent and seed it when empty. Safe to call
/// on every start.
pub async fn initialize(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id       INTEGER PRIMARY KEY,
            name     TEXT    NOT NULL CHECK (length(name) > 0),
            rfid_tag TEXT    UNIQUE,
            quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
            price    REAL    NOT NULL DEFAULT 0 CHECK (price >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    seed::seed_if_empty(pool).await?;
    Ok(())
}

// ── Items ─────────────────────────────────────────────────────────────────────

pub async fn fetch_all_items(pool: &SqlitePool) -> AppResult<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(
        "SELECT id, name, rfid_tag, quantity, price FROM items",
    )
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn fetch_item_by_tag(pool: &SqlitePool, tag: &str) -> AppResult<Item> {
    let mut matches = sqlx::query_as::<_, Item>(
        "SELECT id, name, rfid_tag, quantity, price FROM items WHERE rfid_tag = ?",
    )
    .bind(tag)
    .fetch_all(pool)
    .await?;

    if matches.len() > 1 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "{} items share rfid_tag {}",
            matches.len(),
            tag
        )));
    }

    matches
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Item with tag {} not found", tag)))
}

/// Overwrite the quantity of the item with `tag`. Returns the number of rows
/// touched; zero means no item carries that tag.
pub async fn set_quantity(pool: &SqlitePool, tag: &str, quantity: i64) -> AppResult<u64> {
    if quantity < 0 {
        return Err(AppError::BadRequest("quantity must be >= 0".to_string()));
    }

    let result = sqlx::query("UPDATE items SET quantity = ? WHERE rfid_tag = ?")
        .bind(quantity)
        .bind(tag)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Apply one scan as a single statement so concurrent scans of the same tag
/// cannot lose updates. Returns the stored quantity after the update.
pub async fn apply_scan(pool: &SqlitePool, tag: &str, action: ScanAction) -> AppResult<i64> {
    let sql = match action {
        ScanAction::Add => {
            "UPDATE items SET quantity = quantity + 1 WHERE rfid_tag = ? RETURNING quantity"
        }
        ScanAction::Remove => {
            "UPDATE items SET quantity = MAX(quantity - 1, 0) WHERE rfid_tag = ? RETURNING quantity"
        }
    };

    let row: Option<(i64,)> = sqlx::query_as(sql).bind(tag).fetch_optional(pool).await?;

    row.map(|(quantity,)| quantity)
        .ok_or_else(|| AppError::NotFound(format!("Item with tag {} not found", tag)))
}

pub async fn fetch_low_stock_items(pool: &SqlitePool, threshold: i64) -> AppResult<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(
        "SELECT id, name, rfid_tag, quantity, price FROM items WHERE quantity < ?",
    )
    .bind(threshold)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn count_items(pool: &SqlitePool) -> AppResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// In-memory pool for tests. One connection, since each SQLite memory
/// connection owns a separate database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:", 1).await.unwrap();
    initialize(&pool).await.unwrap();
    pool
}
