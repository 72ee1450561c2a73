//! SQLite save slots holding exported snapshots.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Metadata of a stored save slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveSlot {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// Create the directory holding a file-backed sqlite database.
fn ensure_parent_dir(url: &str) -> Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .filter(|p| !p.starts_with(":memory:"));
    if let Some(parent) = path.and_then(|p| Path::new(p).parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Open (creating if needed) the database at `url` and ensure the schema.
pub async fn init_db(url: &str) -> Result<SqlitePool> {
    ensure_parent_dir(url)?;
    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid sqlite url {url}"))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS saves (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            snapshot TEXT
        )",
    )
    .execute(&pool)
    .await?;
    info!(url, "save database ready");
    Ok(pool)
}

/// Create an empty save slot and return its id.
pub async fn create_save(pool: &SqlitePool, name: &str, description: Option<&str>) -> Result<i64> {
    let res = sqlx::query("INSERT INTO saves (name, description) VALUES (?1, ?2)")
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

/// Store an exported snapshot document in slot `id`.
pub async fn store_snapshot(pool: &SqlitePool, id: i64, snapshot_json: &str) -> Result<()> {
    let res = sqlx::query("UPDATE saves SET snapshot = ?1 WHERE id = ?2")
        .bind(snapshot_json)
        .bind(id)
        .execute(pool)
        .await?;
    anyhow::ensure!(res.rows_affected() == 1, "save slot {id} not found");
    Ok(())
}

/// Snapshot JSON stored in slot `id`, if any.
pub async fn load_snapshot(pool: &SqlitePool, id: i64) -> Result<Option<String>> {
    let row = sqlx::query("SELECT snapshot FROM saves WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Ok(row.try_get::<Option<String>, _>("snapshot")?),
        None => Ok(None),
    }
}

pub async fn list_saves(pool: &SqlitePool) -> Result<Vec<SaveSlot>> {
    let rows = sqlx::query("SELECT id, name, description, created_at FROM saves ORDER BY id")
        .fetch_all(pool)
        .await?;
    rows.into_iter()
        .map(|row| -> Result<SaveSlot> {
            Ok(SaveSlot {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}
