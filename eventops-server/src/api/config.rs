//! Configuration endpoints
//!
//! All writes go through the config access layer, which re-validates
//! invariants against the full proposed value before persisting; the
//! handlers here parse input, enforce the itemized-error contract for
//! discount windows, and decode the JSON columns for responses.

use axum::{extract::State, Json};
use eventops_common::db::models::{
    ConfigRow, DiscountWindow, EventState, PaymentAccounts,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::config as config_db;
use crate::discount;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Config with its JSON columns decoded, as returned to staff
#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub discounts_enabled: bool,
    pub discount_windows: Vec<DiscountWindow>,
    pub price_free: f64,
    pub price_priority: f64,
    pub price_vip: f64,
    pub payment_accounts: PaymentAccounts,
    pub event_name: String,
    pub event_date: String,
    pub event_start_time: String,
    pub event_end_time: String,
    pub event_max_capacity: i64,
    pub event_state: EventState,
}

impl From<ConfigRow> for ConfigView {
    fn from(row: ConfigRow) -> Self {
        ConfigView {
            discounts_enabled: row.discounts_enabled,
            discount_windows: row.windows(),
            payment_accounts: row.accounts(),
            price_free: row.price_free,
            price_priority: row.price_priority,
            price_vip: row.price_vip,
            event_name: row.event_name,
            event_date: row.event_date,
            event_start_time: row.event_start_time,
            event_end_time: row.event_end_time,
            event_max_capacity: row.event_max_capacity,
            event_state: row.event_state,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub config: ConfigView,
}

/// GET /api/config - Full configuration (staff)
pub async fn get_config(State(state): State<AppState>) -> ApiResult<Json<ConfigResponse>> {
    let config = config_db::ensure_config(&state.db, state.clock.now()).await?;
    Ok(Json(ConfigResponse { config: config.into() }))
}

/// Subset of config the public request page needs
#[derive(Debug, Serialize)]
pub struct PublicConfigResponse {
    pub event_name: String,
    pub event_state: EventState,
    pub price_free: f64,
    pub price_priority: f64,
    pub price_vip: f64,
    pub payment_accounts: PaymentAccounts,
}

/// GET /api/public/config - Prices and payment info for the request modal
pub async fn public_config(State(state): State<AppState>) -> ApiResult<Json<PublicConfigResponse>> {
    let config = config_db::ensure_config(&state.db, state.clock.now()).await?;
    Ok(Json(PublicConfigResponse {
        event_name: config.event_name.clone(),
        event_state: config.event_state,
        price_free: config.price_free,
        price_priority: config.price_priority,
        price_vip: config.price_vip,
        payment_accounts: config.accounts(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DiscountsUpdateRequest {
    pub enabled: bool,
    pub windows: Vec<DiscountWindow>,
}

/// PATCH /api/config/discounts - Replace the discount window set (admin)
///
/// Rejected with the complete list of violations when validation fails;
/// nothing is written in that case.
pub async fn update_discounts(
    State(state): State<AppState>,
    Json(req): Json<DiscountsUpdateRequest>,
) -> ApiResult<Json<ConfigResponse>> {
    let errors = discount::validate_windows(&req.windows);
    if !errors.is_empty() {
        return Err(ApiError::Validation(
            "Invalid discount windows".to_string(),
            errors,
        ));
    }

    let config =
        config_db::update_discounts(&state.db, req.enabled, &req.windows, state.clock.now())
            .await?;
    Ok(Json(ConfigResponse { config: config.into() }))
}

#[derive(Debug, Deserialize)]
pub struct PricesUpdateRequest {
    pub free: f64,
    pub priority: f64,
    pub vip: f64,
}

/// PATCH /api/config/prices - Update per-tier request prices (admin)
pub async fn update_prices(
    State(state): State<AppState>,
    Json(req): Json<PricesUpdateRequest>,
) -> ApiResult<Json<ConfigResponse>> {
    let config =
        config_db::update_prices(&state.db, req.free, req.priority, req.vip, state.clock.now())
            .await?;
    Ok(Json(ConfigResponse { config: config.into() }))
}

#[derive(Debug, Deserialize)]
pub struct EventUpdateRequest {
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub max_capacity: i64,
    pub state: String,
}

/// PATCH /api/config/event - Update event metadata (admin)
pub async fn update_event(
    State(state): State<AppState>,
    Json(req): Json<EventUpdateRequest>,
) -> ApiResult<Json<ConfigResponse>> {
    let event_state = req
        .state
        .parse::<EventState>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let update = config_db::EventUpdate {
        name: req.name,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
        max_capacity: req.max_capacity,
        state: event_state,
    };

    let config = config_db::update_event(&state.db, &update, state.clock.now()).await?;
    info!("Event config updated: '{}' ({:?})", config.event_name, config.event_state);
    Ok(Json(ConfigResponse { config: config.into() }))
}

/// PATCH /api/config/payment-accounts - Replace payment display info (admin)
pub async fn update_payment_accounts(
    State(state): State<AppState>,
    Json(req): Json<PaymentAccounts>,
) -> ApiResult<Json<ConfigResponse>> {
    let config =
        config_db::update_payment_accounts(&state.db, &req, state.clock.now()).await?;
    Ok(Json(ConfigResponse { config: config.into() }))
}
