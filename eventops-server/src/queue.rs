//! Song queue rules
//!
//! Pure ordering and composition logic for the three tier queues. The
//! persistence layer hands in per-tier lists already sorted by their tier's
//! rules (FREE by votes, paid tiers by queue order); this module merges
//! them into the attendee-facing "up next" preview and owns the static
//! wait-time estimate.

use eventops_common::db::models::Song;

/// Static per-song duration assumption used for the wait estimate
pub const MINUTES_PER_SONG: i64 = 3;

/// How many songs the merged "up next" preview shows
pub const UP_NEXT_SIZE: usize = 3;

/// Maximum FREE songs allowed in {PENDING_APPROVAL, QUEUED} at once.
///
/// PENDING_APPROVAL is counted even though FREE songs never enter it;
/// the bound holds regardless of how a row got into that state.
pub const FREE_QUEUE_CAPACITY: i64 = 100;

/// Estimated wait shown to a requester at a queue position (1-based)
pub fn estimated_wait_minutes(position: i64) -> i64 {
    position * MINUTES_PER_SONG
}

/// Build the merged "up next" list from the per-tier queues
///
/// VIP always outranks PRIORITY which always outranks FREE: the preview
/// takes the head of each tier in that order, then fills any remaining
/// slots from the combined remainder in the same tier-priority order.
/// Tiers are never interleaved by wait time or fairness.
pub fn up_next(vip: &[Song], priority: &[Song], free: &[Song]) -> Vec<Song> {
    let mut next: Vec<Song> = Vec::with_capacity(UP_NEXT_SIZE);

    if let Some(head) = vip.first() {
        next.push(head.clone());
    }
    if let Some(head) = priority.first() {
        next.push(head.clone());
    }
    if let Some(head) = free.first() {
        if next.len() < UP_NEXT_SIZE {
            next.push(head.clone());
        }
    }

    if next.len() < UP_NEXT_SIZE {
        let remainder = vip
            .iter()
            .skip(1)
            .chain(priority.iter().skip(1))
            .chain(free.iter().skip(1));
        for song in remainder {
            if next.len() >= UP_NEXT_SIZE {
                break;
            }
            next.push(song.clone());
        }
    }

    next.truncate(UP_NEXT_SIZE);
    next
}
