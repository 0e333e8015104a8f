//! Dining Table Repository

use super::{RepoError, RepoResult};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(
        "SELECT id, number, capacity, status, created_at, updated_at FROM dining_table ORDER BY number",
    )
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(
        "SELECT id, number, capacity, status, created_at, updated_at FROM dining_table WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(table)
}

pub async fn find_by_number(pool: &SqlitePool, number: i64) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(
        "SELECT id, number, capacity, status, created_at, updated_at FROM dining_table WHERE number = ? LIMIT 1",
    )
    .bind(number)
    .fetch_optional(pool)
    .await?;
    Ok(table)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    if data.number <= 0 {
        return Err(RepoError::Validation(format!(
            "Table number must be positive, got {}",
            data.number
        )));
    }
    let capacity = data.capacity.unwrap_or(4);
    if capacity <= 0 {
        return Err(RepoError::Validation(format!(
            "Capacity must be positive, got {capacity}"
        )));
    }

    if find_by_number(pool, data.number).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Table {} already exists",
            data.number
        )));
    }

    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO dining_table (id, number, capacity, status, created_at, updated_at) VALUES (?, ?, ?, 'AVAILABLE', ?, ?)",
    )
    .bind(id)
    .bind(data.number)
    .bind(capacity)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dining table".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))?;

    let number = data.number.unwrap_or(existing.number);
    let capacity = data.capacity.unwrap_or(existing.capacity);
    if capacity <= 0 {
        return Err(RepoError::Validation(format!(
            "Capacity must be positive, got {capacity}"
        )));
    }
    if number != existing.number && find_by_number(pool, number).await?.is_some() {
        return Err(RepoError::Duplicate(format!("Table {number} already exists")));
    }

    let now = shared::util::now_millis();
    sqlx::query("UPDATE dining_table SET number = ?, capacity = ?, updated_at = ? WHERE id = ?")
        .bind(number)
        .bind(capacity)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM dining_table WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Persist a derived status, skipping the write when it already matches.
///
/// Returns true when a row actually changed (idempotent no-op avoidance is
/// done in SQL via the `status != ?` guard).
pub async fn set_status(pool: &SqlitePool, id: i64, status: TableStatus) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE dining_table SET status = ?, updated_at = ? WHERE id = ? AND status != ?",
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .bind(status)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
