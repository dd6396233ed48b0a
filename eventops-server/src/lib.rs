//! eventops-server library - HTTP service for live-event operations
//!
//! Wires the discount engine, the song-request queue and the singleton
//! config behind an axum router. Public routes serve attendees (menu
//! discount state, song requests, queue view); role-guarded routes serve
//! staff (approval, playback transitions, configuration).

use axum::{extract::DefaultBodyLimit, middleware, Router};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use eventops_common::time::Clock;

pub mod api;
pub mod db;
pub mod discount;
pub mod error;
pub mod queue;
pub mod storage;

use storage::ProofStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Injectable clock; tests pin it for deterministic discount/wait math
    pub clock: Arc<dyn Clock>,
    /// Payment-proof image storage
    pub store: Arc<dyn ProofStore>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, clock: Arc<dyn Clock>, store: Arc<dyn ProofStore>) -> Self {
        Self { db, clock, store }
    }
}

/// Build application router
///
/// `proofs_dir` is served statically under `/proofs` so staff can open
/// uploaded payment-proof images from the dashboard.
pub fn build_router(state: AppState, proofs_dir: PathBuf) -> Router {
    use axum::routing::{delete, get, patch, post};

    // Admin-only routes
    let admin = Router::new()
        .route("/api/songs/stats", get(api::songs::song_stats))
        .route("/api/songs/:id/approve", patch(api::songs::approve_song))
        .route("/api/songs/:id", delete(api::songs::delete_song))
        .route("/api/config/discounts", patch(api::config::update_discounts))
        .route("/api/config/prices", patch(api::config::update_prices))
        .route("/api/config/event", patch(api::config::update_event))
        .route(
            "/api/config/payment-accounts",
            patch(api::config::update_payment_accounts),
        )
        .layer(middleware::from_fn(api::auth::require_admin));

    // Queue-operating staff routes (admin or bartender)
    let staff = Router::new()
        .route("/api/songs/all", get(api::songs::list_songs))
        .route("/api/songs/:id/state", patch(api::songs::update_song_state))
        .route("/api/config", get(api::config::get_config))
        .layer(middleware::from_fn(api::auth::require_queue_staff));

    // Public routes (no authentication); body limit sized for proof uploads
    let public = Router::new()
        .route("/health", get(api::health::health))
        .route("/api/discount/current", get(api::discounts::current_discount))
        .route("/api/public/config", get(api::config::public_config))
        .route("/api/songs", post(api::songs::create_free_song))
        .route("/api/songs/priority", post(api::songs::create_priority_song))
        .route("/api/songs/vip", post(api::songs::create_vip_song))
        .route("/api/songs/:id/vote", patch(api::songs::vote_song))
        .route("/api/songs/public", get(api::songs::public_queue))
        .layer(DefaultBodyLimit::max(storage::MAX_PROOF_BYTES + 64 * 1024));

    Router::new()
        .merge(admin)
        .merge(staff)
        .merge(public)
        .nest_service("/proofs", tower_http::services::ServeDir::new(proofs_dir))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
