use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppResult;

/// Starter rows written into an empty `items` table: (name, tag, quantity, price).
pub static SEED_ITEMS: &[(&str, &str, i64, f64)] = &[
    ("Notebook", "TAG001", 15, 2.50),
    ("Pen", "TAG002", 8, 1.20),
    ("Stapler", "TAG003", 3, 8.99),
];

/// Insert the starter rows if, and only if, the table holds no items.
/// Returns the number of rows written (0 when the table was already populated).
pub async fn seed_if_empty(pool: &SqlitePool) -> AppResult<usize> {
    let mut tx = pool.begin().await?;

    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
        .fetch_one(&mut *tx)
        .await?;

    if existing > 0 {
        info!(existing, "Item table already populated, skipping seed");
        return Ok(0);
    }

    for &(name, tag, quantity, price) in SEED_ITEMS {
        sqlx::query("INSERT INTO items (name, rfid_tag, quantity, price) VALUES (?, ?, ?, ?)")
            .bind(name)
            .bind(tag)
            .bind(quantity)
            .bind(price)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(seeded = SEED_ITEMS.len(), "Seeded empty item table");
    Ok(SEED_ITEMS.len())
}
