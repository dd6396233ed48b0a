//! Discount endpoints
//!
//! `GET /api/discount/current` is polled by the public menu and the POS
//! cart alike; both see the same [`crate::discount::evaluate`] output, so
//! attendee and staff pricing can never disagree.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::db::config as config_db;
use crate::discount::{self, NextWindow};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CurrentDiscountResponse {
    pub percentage: f64,
    pub description: String,
    pub active: bool,
    pub remaining_minutes: i64,
    pub next_window: Option<NextWindow>,
}

/// GET /api/discount/current - Evaluate discount windows at the current time
pub async fn current_discount(
    State(state): State<AppState>,
) -> ApiResult<Json<CurrentDiscountResponse>> {
    let now = state.clock.now();
    let config = config_db::ensure_config(&state.db, now).await?;

    let status = discount::evaluate(&config.windows(), config.discounts_enabled, now);

    Ok(Json(CurrentDiscountResponse {
        percentage: status.percentage,
        description: status.description,
        active: status.active,
        remaining_minutes: status.remaining_minutes,
        next_window: status.next_window,
    }))
}
