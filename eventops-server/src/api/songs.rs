//! Song request endpoints
//!
//! Public: create requests (free or paid-with-proof), vote, read the
//! public queue. Staff: approve, transition states, list, stats, delete.
//! Business rules live in the data-access and queue modules; handlers
//! validate input and shape responses.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use eventops_common::db::models::{Song, SongState, SongTier};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::db::{config as config_db, songs as songs_db};
use crate::error::{ApiError, ApiResult};
use crate::queue;
use crate::storage::{ALLOWED_PROOF_TYPES, MAX_PROOF_BYTES};
use crate::AppState;

/// Best-effort requester IP from proxy headers
fn requester_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// ============================================================================
// Public: create requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FreeSongRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub requester_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FreeSongResponse {
    pub song: Song,
    pub queue_position: i64,
    pub estimated_wait_minutes: i64,
}

/// POST /api/songs - Create a FREE request (public, auto-queued)
pub async fn create_free_song(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<FreeSongRequest>,
) -> ApiResult<Json<FreeSongResponse>> {
    let (Some(title), Some(artist)) = (non_empty(req.title), non_empty(req.artist)) else {
        return Err(ApiError::BadRequest("Title and artist are required".to_string()));
    };

    let input = songs_db::NewSong {
        title,
        artist,
        requester_name: non_empty(req.requester_name)
            .unwrap_or_else(|| "Anonymous".to_string()),
        requester_ip: requester_ip(&headers),
    };

    let (song, position) = songs_db::create_free_song(&state.db, &input, state.clock.now()).await?;

    Ok(Json(FreeSongResponse {
        estimated_wait_minutes: queue::estimated_wait_minutes(position),
        queue_position: position,
        song,
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parsed multipart form for a paid request
#[derive(Debug, Default)]
struct PaidRequestForm {
    title: Option<String>,
    artist: Option<String>,
    requester_name: Option<String>,
    dedication_from: Option<String>,
    dedication_to: Option<String>,
    dedication_message: Option<String>,
    proof_bytes: Option<Vec<u8>>,
    proof_content_type: Option<String>,
}

/// Uniform mapping for multipart read failures
///
/// A body cut off by the request size limit surfaces as a 413 from the
/// multipart reader; report it the same way as an oversized-but-readable
/// proof so clients see one error shape.
fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BadRequest("Proof image must not exceed 5MB".to_string())
    } else {
        ApiError::BadRequest(format!("Malformed multipart body: {e}"))
    }
}

async fn read_paid_form(mut multipart: Multipart) -> ApiResult<PaidRequestForm> {
    let mut form = PaidRequestForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "proof" => {
                form.proof_content_type =
                    field.content_type().map(|ct| ct.to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.proof_bytes = Some(bytes.to_vec());
            }
            other => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field '{other}': {e}")))?;
                let value = Some(value).filter(|v| !v.trim().is_empty());
                match other {
                    "title" => form.title = value,
                    "artist" => form.artist = value,
                    "requester_name" => form.requester_name = value,
                    "dedication_from" => form.dedication_from = value,
                    "dedication_to" => form.dedication_to = value,
                    "dedication_message" => form.dedication_message = value,
                    _ => {} // unknown fields ignored
                }
            }
        }
    }

    Ok(form)
}

fn validate_proof(form: &PaidRequestForm) -> ApiResult<(&[u8], &str)> {
    let bytes = form
        .proof_bytes
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Proof of payment is required".to_string()))?;

    if bytes.len() > MAX_PROOF_BYTES {
        return Err(ApiError::BadRequest(
            "Proof image must not exceed 5MB".to_string(),
        ));
    }

    let content_type = form.proof_content_type.as_deref().unwrap_or_default();
    if !ALLOWED_PROOF_TYPES.contains(&content_type) {
        return Err(ApiError::BadRequest(
            "Only JPG, PNG or WEBP images are allowed".to_string(),
        ));
    }

    Ok((bytes, content_type))
}

#[derive(Debug, Serialize)]
pub struct PaidSongResponse {
    pub song: Song,
    pub status: String,
    pub message: String,
}

async fn create_paid_song(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Multipart,
    tier: SongTier,
) -> ApiResult<Json<PaidSongResponse>> {
    let form = read_paid_form(multipart).await?;

    let (Some(title), Some(artist)) = (form.title.clone(), form.artist.clone()) else {
        return Err(ApiError::BadRequest("Title and artist are required".to_string()));
    };

    if tier.supports_dedication()
        && (form.dedication_from.is_none() || form.dedication_to.is_none())
    {
        return Err(ApiError::BadRequest(
            "Dedication 'from' and 'to' are required for VIP requests".to_string(),
        ));
    }

    let (bytes, content_type) = validate_proof(&form)?;

    let now = state.clock.now();
    let config = config_db::ensure_config(&state.db, now).await?;

    let proof = state.store.store(bytes, content_type)?;

    let input = songs_db::NewPaidSong {
        base: songs_db::NewSong {
            title,
            artist,
            requester_name: form
                .requester_name
                .unwrap_or_else(|| "Anonymous".to_string()),
            requester_ip: requester_ip(headers),
        },
        amount_due: config.price_for(tier),
        proof_url: proof.url.clone(),
        proof_key: proof.key.clone(),
        dedication_from: form.dedication_from,
        dedication_to: form.dedication_to,
        dedication_message: form.dedication_message,
    };

    let song = match songs_db::create_paid_song(&state.db, tier, &input, now).await {
        Ok(song) => song,
        Err(e) => {
            // The row never landed; don't orphan the uploaded image
            if let Err(del) = state.store.delete(&proof.key) {
                warn!("Failed to clean up proof {} after error: {}", proof.key, del);
            }
            return Err(e.into());
        }
    };

    let message = match tier {
        SongTier::Vip => {
            "Your VIP request is pending approval. The DJ will review your proof and \
             your dedication will be read out when the song plays."
        }
        _ => "Your request is pending approval. The DJ will review your proof shortly.",
    };

    Ok(Json(PaidSongResponse {
        song,
        status: "pending_approval".to_string(),
        message: message.to_string(),
    }))
}

/// POST /api/songs/priority - Create a PRIORITY request (public, multipart)
pub async fn create_priority_song(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<PaidSongResponse>> {
    create_paid_song(&state, &headers, multipart, SongTier::Priority).await
}

/// POST /api/songs/vip - Create a VIP request with dedication (public, multipart)
pub async fn create_vip_song(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<PaidSongResponse>> {
    create_paid_song(&state, &headers, multipart, SongTier::Vip).await
}

// ============================================================================
// Public: voting and queue view
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub votes: i64,
    pub already_voted: bool,
    pub message: String,
}

/// PATCH /api/songs/:id/vote - Vote for a free song (idempotent per device)
pub async fn vote_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let Some(device_id) = non_empty(req.device_id) else {
        return Err(ApiError::BadRequest("Device ID is required".to_string()));
    };

    let (votes, already_voted) =
        songs_db::vote_song(&state.db, &id, &device_id, state.clock.now()).await?;

    let message = if already_voted {
        "You already voted for this song".to_string()
    } else {
        "Vote registered".to_string()
    };

    Ok(Json(VoteResponse { votes, already_voted, message }))
}

#[derive(Debug, Serialize)]
pub struct PublicQueueResponse {
    pub now_playing: Option<Song>,
    pub free: Vec<Song>,
    pub priority: Vec<Song>,
    pub vip: Vec<Song>,
    pub up_next: Vec<Song>,
}

/// GET /api/songs/public - Attendee-facing queue view (polled)
pub async fn public_queue(State(state): State<AppState>) -> ApiResult<Json<PublicQueueResponse>> {
    let now_playing = songs_db::now_playing(&state.db).await?;
    let free = songs_db::list_free_queued(&state.db, 20).await?;
    let priority = songs_db::list_paid_queued(&state.db, SongTier::Priority, 10).await?;
    let vip = songs_db::list_paid_queued(&state.db, SongTier::Vip, 10).await?;

    let up_next = queue::up_next(&vip, &priority, &free);

    Ok(Json(PublicQueueResponse { now_playing, free, priority, vip, up_next }))
}

// ============================================================================
// Staff: approval, state transitions, listing, deletion
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub approved: bool,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub song: Song,
    pub message: String,
}

/// PATCH /api/songs/:id/approve - Approve or reject a paid request (admin)
pub async fn approve_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<Json<ApproveResponse>> {
    let song = songs_db::approve_song(&state.db, &id, req.approved, state.clock.now()).await?;

    let message = if req.approved {
        "Request approved and added to the queue".to_string()
    } else {
        "Request rejected".to_string()
    };

    Ok(Json(ApproveResponse { song, message }))
}

#[derive(Debug, Deserialize)]
pub struct StateUpdateRequest {
    pub state: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub song: Song,
}

/// PATCH /api/songs/:id/state - Staff state transition
///
/// Setting PLAYING force-flips any other playing song to PLAYED; setting
/// PLAYED computes the wait time once.
pub async fn update_song_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StateUpdateRequest>,
) -> ApiResult<Json<SongResponse>> {
    let new_state = req
        .state
        .parse::<SongState>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid song state: {}", req.state)))?;

    let song = songs_db::set_song_state(
        &state.db,
        &id,
        new_state,
        req.notes.as_deref(),
        state.clock.now(),
    )
    .await?;

    Ok(Json(SongResponse { song }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tier: Option<String>,
    pub state: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/songs/all - Staff dashboard listing (admin/bartender)
pub async fn list_songs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<songs_db::SongPage>> {
    let tier = query
        .tier
        .map(|t| t.parse::<SongTier>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let song_state = query
        .state
        .map(|s| s.parse::<SongState>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let page = songs_db::list_songs(
        &state.db,
        tier,
        song_state,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(50),
    )
    .await?;

    Ok(Json(page))
}

/// GET /api/songs/stats - Revenue and queue aggregates (admin)
pub async fn song_stats(State(state): State<AppState>) -> ApiResult<Json<songs_db::SongStats>> {
    let stats = songs_db::song_stats(&state.db).await?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: String,
}

/// DELETE /api/songs/:id - Hard-delete a song (admin)
///
/// The stored proof image is released best-effort: a missing or
/// undeletable image never blocks the deletion.
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let song = songs_db::delete_song(&state.db, &id).await?;

    if let Some(key) = song.proof_key.as_deref() {
        if let Err(e) = state.store.delete(key) {
            error!("Failed to delete proof image {} for song {}: {}", key, id, e);
        } else {
            info!("Released proof image {} for deleted song {}", key, id);
        }
    }

    Ok(Json(DeleteResponse { deleted: id }))
}
