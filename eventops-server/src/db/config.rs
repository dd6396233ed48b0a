//! Singleton config access
//!
//! The configuration aggregate is one well-known row (id "singleton"),
//! created lazily with defaults on first read. All writes funnel through
//! the update functions here, which re-validate invariants (discount window
//! overlap) against the full proposed value before persisting - partial
//! patches can never bypass validation.

use chrono::{DateTime, Utc};
use eventops_common::db::models::{ConfigRow, DiscountWindow, EventState, PaymentAccounts};
use eventops_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::discount;

/// Fixed primary key of the one config row
pub const CONFIG_ID: &str = "singleton";

fn default_windows() -> Vec<DiscountWindow> {
    vec![
        DiscountWindow {
            start_time: "21:00".to_string(),
            end_time: "22:00".to_string(),
            percentage: 30.0,
            label: "Early happy hour".to_string(),
        },
        DiscountWindow {
            start_time: "22:00".to_string(),
            end_time: "23:00".to_string(),
            percentage: 20.0,
            label: "Happy hour".to_string(),
        },
        DiscountWindow {
            start_time: "23:00".to_string(),
            end_time: "23:59".to_string(),
            percentage: 10.0,
            label: "Last call".to_string(),
        },
    ]
}

/// Ensure the singleton row exists, then return it
///
/// Idempotent: concurrent first reads race harmlessly on INSERT OR IGNORE.
pub async fn ensure_config(pool: &SqlitePool, now: DateTime<Utc>) -> Result<ConfigRow> {
    let windows =
        serde_json::to_string(&default_windows()).map_err(|e| Error::Internal(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO config
            (id, discounts_enabled, discount_windows, price_free, price_priority,
             price_vip, payment_accounts, event_name, event_date, event_start_time,
             event_end_time, event_max_capacity, event_state, created_at, updated_at)
        VALUES (?, 0, ?, 0.0, 5.0, 8.0, '{}', '', '', '21:00', '23:59', 100, 'preparation', ?, ?)
        "#,
    )
    .bind(CONFIG_ID)
    .bind(windows)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_config(pool).await
}

/// Fetch the singleton row (must already exist)
pub async fn get_config(pool: &SqlitePool) -> Result<ConfigRow> {
    let config = sqlx::query_as::<_, ConfigRow>("SELECT * FROM config WHERE id = ?")
        .bind(CONFIG_ID)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Config not initialized".to_string()))?;
    Ok(config)
}

/// Replace the discount configuration
///
/// Rejects the whole update (no partial write) when the proposed window set
/// fails validation; the caller receives every violation found.
pub async fn update_discounts(
    pool: &SqlitePool,
    enabled: bool,
    windows: &[DiscountWindow],
    now: DateTime<Utc>,
) -> Result<ConfigRow> {
    let errors = discount::validate_windows(windows);
    if !errors.is_empty() {
        return Err(Error::InvalidInput(errors.join("; ")));
    }

    ensure_config(pool, now).await?;

    let encoded = serde_json::to_string(windows).map_err(|e| Error::Internal(e.to_string()))?;
    sqlx::query(
        "UPDATE config SET discounts_enabled = ?, discount_windows = ?, updated_at = ? WHERE id = ?",
    )
    .bind(enabled)
    .bind(encoded)
    .bind(now)
    .bind(CONFIG_ID)
    .execute(pool)
    .await?;

    info!("Discount config updated: enabled={} windows={}", enabled, windows.len());
    get_config(pool).await
}

/// Update the per-tier song request prices
pub async fn update_prices(
    pool: &SqlitePool,
    free: f64,
    priority: f64,
    vip: f64,
    now: DateTime<Utc>,
) -> Result<ConfigRow> {
    if free < 0.0 || priority < 0.0 || vip < 0.0 {
        return Err(Error::InvalidInput("Prices must be non-negative".to_string()));
    }

    ensure_config(pool, now).await?;

    sqlx::query(
        "UPDATE config SET price_free = ?, price_priority = ?, price_vip = ?, updated_at = ? WHERE id = ?",
    )
    .bind(free)
    .bind(priority)
    .bind(vip)
    .bind(now)
    .bind(CONFIG_ID)
    .execute(pool)
    .await?;

    info!("Song prices updated: free={free} priority={priority} vip={vip}");
    get_config(pool).await
}

/// Event metadata fields settable by the admin
#[derive(Debug, Clone)]
pub struct EventUpdate {
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub max_capacity: i64,
    pub state: EventState,
}

/// Update event metadata on the singleton
pub async fn update_event(
    pool: &SqlitePool,
    update: &EventUpdate,
    now: DateTime<Utc>,
) -> Result<ConfigRow> {
    if update.max_capacity < 1 {
        return Err(Error::InvalidInput("Event capacity must be at least 1".to_string()));
    }

    ensure_config(pool, now).await?;

    sqlx::query(
        r#"
        UPDATE config SET event_name = ?, event_date = ?, event_start_time = ?,
            event_end_time = ?, event_max_capacity = ?, event_state = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.name)
    .bind(&update.date)
    .bind(&update.start_time)
    .bind(&update.end_time)
    .bind(update.max_capacity)
    .bind(update.state)
    .bind(now)
    .bind(CONFIG_ID)
    .execute(pool)
    .await?;

    get_config(pool).await
}

/// Replace the payment-accounts display info
pub async fn update_payment_accounts(
    pool: &SqlitePool,
    accounts: &PaymentAccounts,
    now: DateTime<Utc>,
) -> Result<ConfigRow> {
    ensure_config(pool, now).await?;

    let encoded = serde_json::to_string(accounts).map_err(|e| Error::Internal(e.to_string()))?;
    sqlx::query("UPDATE config SET payment_accounts = ?, updated_at = ? WHERE id = ?")
        .bind(encoded)
        .bind(now)
        .bind(CONFIG_ID)
        .execute(pool)
        .await?;

    get_config(pool).await
}
