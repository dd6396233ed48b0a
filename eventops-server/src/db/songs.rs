//! Song request data access
//!
//! All multi-field mutations (create with order assignment, approval,
//! play transitions, voting) run inside a single transaction so no caller
//! ever observes partial state: queue orders are read and written under
//! the same write lock, and "mark PLAYING" flips any other playing song to
//! PLAYED in the same commit.

use chrono::{DateTime, Utc};
use eventops_common::db::models::{Song, SongState, SongTier};
use eventops_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::queue::FREE_QUEUE_CAPACITY;

/// Fields common to every new song request
#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub requester_name: String,
    pub requester_ip: String,
}

/// Extra fields for a paid (PRIORITY/VIP) request
#[derive(Debug, Clone)]
pub struct NewPaidSong {
    pub base: NewSong,
    pub amount_due: f64,
    pub proof_url: String,
    pub proof_key: String,
    pub dedication_from: Option<String>,
    pub dedication_to: Option<String>,
    pub dedication_message: Option<String>,
}

/// Fetch one song by id
pub async fn get_song(pool: &SqlitePool, guid: &str) -> Result<Song> {
    sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Song not found: {guid}")))
}

/// Create a FREE request: auto-queued, capacity-guarded, order assigned
///
/// Returns the song plus its 1-based position in the FREE queue. Capacity
/// counts PENDING_APPROVAL alongside QUEUED as a defensive bound even
/// though FREE songs never enter approval.
pub async fn create_free_song(
    pool: &SqlitePool,
    input: &NewSong,
    now: DateTime<Utc>,
) -> Result<(Song, i64)> {
    let mut tx = pool.begin().await?;

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM songs WHERE tier = 'FREE' AND state IN ('PENDING_APPROVAL', 'QUEUED')",
    )
    .fetch_one(&mut *tx)
    .await?;

    if active >= FREE_QUEUE_CAPACITY {
        return Err(Error::CapacityExceeded(
            "The free request queue is full".to_string(),
        ));
    }

    let next_order: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(queue_order), 0) + 1 FROM songs WHERE tier = 'FREE' AND state = 'QUEUED'",
    )
    .fetch_one(&mut *tx)
    .await?;

    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO songs (guid, title, artist, requester_name, requester_ip,
                           tier, state, queue_order, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 'FREE', 'QUEUED', ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&input.title)
    .bind(&input.artist)
    .bind(&input.requester_name)
    .bind(&input.requester_ip)
    .bind(next_order)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let song = get_song(pool, &guid).await?;
    info!("Free song queued: '{}' by {} (order {})", song.title, song.artist, next_order);
    Ok((song, active + 1))
}

/// Create a paid request in PENDING_APPROVAL
///
/// The price snapshot and proof references are fixed here; approval later
/// only assigns a queue order and confirms payment.
pub async fn create_paid_song(
    pool: &SqlitePool,
    tier: SongTier,
    input: &NewPaidSong,
    now: DateTime<Utc>,
) -> Result<Song> {
    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO songs (guid, title, artist, requester_name, requester_ip,
                           tier, state, queue_order, amount_due, proof_url, proof_key,
                           dedication_from, dedication_to, dedication_message,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 'PENDING_APPROVAL', 0, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&input.base.title)
    .bind(&input.base.artist)
    .bind(&input.base.requester_name)
    .bind(&input.base.requester_ip)
    .bind(tier)
    .bind(input.amount_due)
    .bind(&input.proof_url)
    .bind(&input.proof_key)
    .bind(&input.dedication_from)
    .bind(&input.dedication_to)
    .bind(&input.dedication_message)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let song = get_song(pool, &guid).await?;
    info!(
        "{} song pending approval: '{}' by {} ({})",
        tier, song.title, song.artist, song.amount_due
    );
    Ok(song)
}

/// Approve or reject a PENDING_APPROVAL paid request
///
/// On approval the queue order is `max(order within that tier's QUEUED
/// partition) + 1`, read and written in one transaction so two concurrent
/// approvals can never assign the same order. Approval and rejection are
/// irreversible for that attempt: an already-processed song is refused.
pub async fn approve_song(
    pool: &SqlitePool,
    guid: &str,
    approved: bool,
    now: DateTime<Utc>,
) -> Result<Song> {
    let mut tx = pool.begin().await?;

    let song = sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE guid = ?")
        .bind(guid)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Song not found: {guid}")))?;

    if !song.tier.requires_approval() {
        return Err(Error::InvalidInput(
            "Free songs do not require approval".to_string(),
        ));
    }

    if song.state != SongState::PendingApproval {
        return Err(Error::Conflict(
            "This song has already been processed".to_string(),
        ));
    }

    if approved {
        let next_order: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(queue_order), 0) + 1 FROM songs WHERE tier = ? AND state = 'QUEUED'",
        )
        .bind(song.tier)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE songs SET state = 'QUEUED', queue_order = ?, paid_confirmed = 1, updated_at = ? WHERE guid = ?",
        )
        .bind(next_order)
        .bind(now)
        .bind(guid)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query(
            "UPDATE songs SET state = 'REJECTED', queue_order = 0, updated_at = ? WHERE guid = ?",
        )
        .bind(now)
        .bind(guid)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        "Song {} {}: '{}' by {}",
        guid,
        if approved { "approved" } else { "rejected" },
        song.title,
        song.artist
    );
    get_song(pool, guid).await
}

/// Staff state transition with its side effects
///
/// Target PLAYING: every other song currently PLAYING is force-flipped to
/// PLAYED in the same transaction (the at-most-one-playing invariant), and
/// `played_at` is stamped. Target PLAYED: `wait_minutes` is computed from
/// `created_at` once, if not already set.
pub async fn set_song_state(
    pool: &SqlitePool,
    guid: &str,
    new_state: SongState,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Song> {
    let mut tx = pool.begin().await?;

    let song = sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE guid = ?")
        .bind(guid)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Song not found: {guid}")))?;

    if new_state == SongState::Playing {
        sqlx::query("UPDATE songs SET state = 'PLAYED', updated_at = ? WHERE state = 'PLAYING'")
            .bind(now)
            .execute(&mut *tx)
            .await?;
    }

    let played_at = if new_state == SongState::Playing {
        Some(now)
    } else {
        song.played_at
    };

    let wait_minutes = if new_state == SongState::Played && song.wait_minutes.is_none() {
        // Whole minutes from request to playback, rounded
        let elapsed_secs = (now - song.created_at).num_seconds();
        Some((elapsed_secs as f64 / 60.0).round() as i64)
    } else {
        song.wait_minutes
    };

    sqlx::query(
        r#"
        UPDATE songs SET state = ?, dj_notes = COALESCE(?, dj_notes),
            played_at = ?, wait_minutes = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(new_state)
    .bind(notes)
    .bind(played_at)
    .bind(wait_minutes)
    .bind(now)
    .bind(guid)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Song {} -> {}", guid, new_state);
    get_song(pool, guid).await
}

/// Register a vote from a device; idempotent per device
///
/// Returns the vote count and whether this device had already voted. The
/// membership check and the increment happen in one transaction, so two
/// devices voting concurrently both land and the same device voting twice
/// never double-counts.
pub async fn vote_song(
    pool: &SqlitePool,
    guid: &str,
    device_id: &str,
    now: DateTime<Utc>,
) -> Result<(i64, bool)> {
    let mut tx = pool.begin().await?;

    let song = sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE guid = ?")
        .bind(guid)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Song not found: {guid}")))?;

    if !song.tier.supports_voting() {
        return Err(Error::InvalidInput(
            "Only free songs can be voted on".to_string(),
        ));
    }

    if song.state != SongState::Queued {
        return Err(Error::Conflict(
            "This song is no longer in the queue".to_string(),
        ));
    }

    if song.has_voted(device_id) {
        return Ok((song.votes, true));
    }

    let mut voters = song.voters();
    voters.push(device_id.to_string());
    let encoded = serde_json::to_string(&voters).map_err(|e| Error::Internal(e.to_string()))?;

    sqlx::query(
        "UPDATE songs SET votes = votes + 1, voter_ids = ?, updated_at = ? WHERE guid = ?",
    )
    .bind(encoded)
    .bind(now)
    .bind(guid)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((song.votes + 1, false))
}

/// Hard-delete a song, returning the removed row
///
/// The caller is responsible for releasing the proof image (best-effort).
pub async fn delete_song(pool: &SqlitePool, guid: &str) -> Result<Song> {
    let song = get_song(pool, guid).await?;
    sqlx::query("DELETE FROM songs WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;
    info!("Song deleted: {} ('{}' by {})", guid, song.title, song.artist);
    Ok(song)
}

/// The song currently PLAYING, if any
pub async fn now_playing(pool: &SqlitePool) -> Result<Option<Song>> {
    let song = sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE state = 'PLAYING' LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(song)
}

/// QUEUED free songs: popularity first, then approval order, then age
pub async fn list_free_queued(pool: &SqlitePool, limit: i64) -> Result<Vec<Song>> {
    let songs = sqlx::query_as::<_, Song>(
        r#"
        SELECT * FROM songs WHERE tier = 'FREE' AND state = 'QUEUED'
        ORDER BY votes DESC, queue_order ASC, created_at ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(songs)
}

/// QUEUED songs of a paid tier in approval (FIFO) order; votes are ignored
pub async fn list_paid_queued(pool: &SqlitePool, tier: SongTier, limit: i64) -> Result<Vec<Song>> {
    let songs = sqlx::query_as::<_, Song>(
        r#"
        SELECT * FROM songs WHERE tier = ? AND state = 'QUEUED'
        ORDER BY queue_order ASC, created_at ASC
        LIMIT ?
        "#,
    )
    .bind(tier)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(songs)
}

/// A page of the staff song list plus totals
#[derive(Debug, Serialize)]
pub struct SongPage {
    pub songs: Vec<Song>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub count_free: i64,
    pub count_priority: i64,
    pub count_vip: i64,
}

/// Staff dashboard listing: optional tier/state filter, paginated
pub async fn list_songs(
    pool: &SqlitePool,
    tier: Option<SongTier>,
    state: Option<SongState>,
    page: i64,
    limit: i64,
) -> Result<SongPage> {
    let page = page.max(1);
    let limit = limit.clamp(1, 200);
    let offset = (page - 1) * limit;

    let songs = sqlx::query_as::<_, Song>(
        r#"
        SELECT * FROM songs
        WHERE (?1 IS NULL OR tier = ?1) AND (?2 IS NULL OR state = ?2)
        ORDER BY tier DESC, queue_order ASC, votes DESC, created_at ASC
        LIMIT ?3 OFFSET ?4
        "#,
    )
    .bind(tier)
    .bind(state)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM songs WHERE (?1 IS NULL OR tier = ?1) AND (?2 IS NULL OR state = ?2)",
    )
    .bind(tier)
    .bind(state)
    .fetch_one(pool)
    .await?;

    let per_tier: Vec<(String, i64)> =
        sqlx::query_as("SELECT tier, COUNT(*) FROM songs GROUP BY tier")
            .fetch_all(pool)
            .await?;
    let count_for = |name: &str| {
        per_tier
            .iter()
            .find(|(tier, _)| tier == name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    };

    Ok(SongPage {
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit.max(1),
        count_free: count_for("FREE"),
        count_priority: count_for("PRIORITY"),
        count_vip: count_for("VIP"),
        songs,
    })
}

/// Aggregates for the admin dashboard
#[derive(Debug, Serialize)]
pub struct SongStats {
    /// Sum of `amount_due` across confirmed paid songs
    pub total_revenue: f64,
    pub total_priority_paid: i64,
    pub total_vip_paid: i64,
    /// Average wait of PLAYED songs, whole minutes
    pub average_wait_minutes: i64,
    pub total_songs: i64,
    pub by_state: std::collections::BTreeMap<String, i64>,
}

/// Compute dashboard statistics over all songs
pub async fn song_stats(pool: &SqlitePool) -> Result<SongStats> {
    let total_revenue: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_due), 0.0) FROM songs WHERE tier IN ('PRIORITY', 'VIP') AND paid_confirmed = 1",
    )
    .fetch_one(pool)
    .await?;

    let total_priority_paid: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM songs WHERE tier = 'PRIORITY' AND paid_confirmed = 1",
    )
    .fetch_one(pool)
    .await?;

    let total_vip_paid: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE tier = 'VIP' AND paid_confirmed = 1")
            .fetch_one(pool)
            .await?;

    let average_wait: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(wait_minutes) FROM songs WHERE state = 'PLAYED' AND wait_minutes IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;

    let total_songs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(pool)
        .await?;

    let by_state: Vec<(String, i64)> =
        sqlx::query_as("SELECT state, COUNT(*) FROM songs GROUP BY state")
            .fetch_all(pool)
            .await?;

    Ok(SongStats {
        total_revenue,
        total_priority_paid,
        total_vip_paid,
        average_wait_minutes: average_wait.map(|avg| avg.round() as i64).unwrap_or(0),
        total_songs,
        by_state: by_state.into_iter().collect(),
    })
}
