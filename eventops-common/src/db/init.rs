//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up with
//! idempotent `CREATE TABLE IF NOT EXISTS` statements, so a fresh deployment
//! needs no manual setup step.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc creates the database file when absent
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while one request writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Wait instead of failing when two requests contend for the write lock
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
///
/// Exposed separately so tests can apply the schema to an in-memory pool.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_config_table(pool).await?;
    create_songs_table(pool).await?;
    Ok(())
}

/// Create the singleton config table
///
/// One row, id fixed to 'singleton'. The row itself is created lazily on
/// first access (see the server's config access layer), not here, so that
/// defaults carry a creation timestamp from the service clock.
async fn create_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS config (
            id TEXT PRIMARY KEY,
            discounts_enabled INTEGER NOT NULL DEFAULT 0,
            discount_windows TEXT NOT NULL DEFAULT '[]',
            price_free REAL NOT NULL DEFAULT 0.0,
            price_priority REAL NOT NULL DEFAULT 5.0,
            price_vip REAL NOT NULL DEFAULT 8.0,
            payment_accounts TEXT NOT NULL DEFAULT '{}',
            event_name TEXT NOT NULL DEFAULT '',
            event_date TEXT NOT NULL DEFAULT '',
            event_start_time TEXT NOT NULL DEFAULT '21:00',
            event_end_time TEXT NOT NULL DEFAULT '23:59',
            event_max_capacity INTEGER NOT NULL DEFAULT 100,
            event_state TEXT NOT NULL DEFAULT 'preparation',
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the songs table
async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            requester_name TEXT NOT NULL DEFAULT 'Anonymous',
            requester_ip TEXT NOT NULL DEFAULT 'unknown',
            tier TEXT NOT NULL,
            state TEXT NOT NULL,
            queue_order INTEGER NOT NULL DEFAULT 0,
            votes INTEGER NOT NULL DEFAULT 0,
            voter_ids TEXT NOT NULL DEFAULT '[]',
            amount_due REAL NOT NULL DEFAULT 0.0,
            paid_confirmed INTEGER NOT NULL DEFAULT 0,
            proof_url TEXT,
            proof_key TEXT,
            dedication_from TEXT,
            dedication_to TEXT,
            dedication_message TEXT,
            played_at TIMESTAMP,
            wait_minutes INTEGER,
            dj_notes TEXT,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Queue reads always filter by (tier, state)
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_songs_tier_state ON songs (tier, state)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
