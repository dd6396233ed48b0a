//! Database models and domain enums
//!
//! Tiers, song states, staff roles and the event lifecycle are closed sum
//! types stored as TEXT. Tier-specific behavior hangs off [`SongTier`] as a
//! small capability table so call sites never branch on raw strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Paid/unpaid category of a song request, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum SongTier {
    Free,
    Priority,
    Vip,
}

impl SongTier {
    /// Canonical TEXT representation stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            SongTier::Free => "FREE",
            SongTier::Priority => "PRIORITY",
            SongTier::Vip => "VIP",
        }
    }

    /// Paid tiers enter PENDING_APPROVAL and wait for staff review;
    /// FREE requests skip approval entirely.
    pub fn requires_approval(&self) -> bool {
        !matches!(self, SongTier::Free)
    }

    /// Paid tiers must attach a proof-of-payment image at creation
    pub fn requires_proof(&self) -> bool {
        !matches!(self, SongTier::Free)
    }

    /// Only FREE songs accumulate attendee votes
    pub fn supports_voting(&self) -> bool {
        matches!(self, SongTier::Free)
    }

    /// Only VIP songs carry a dedication
    pub fn supports_dedication(&self) -> bool {
        matches!(self, SongTier::Vip)
    }
}

impl fmt::Display for SongTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(SongTier::Free),
            "PRIORITY" => Ok(SongTier::Priority),
            "VIP" => Ok(SongTier::Vip),
            other => Err(Error::InvalidInput(format!("Unknown song tier: {other}"))),
        }
    }
}

/// Lifecycle state of a song request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SongState {
    PendingApproval,
    Queued,
    Playing,
    Played,
    Rejected,
}

impl SongState {
    /// Canonical TEXT representation stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            SongState::PendingApproval => "PENDING_APPROVAL",
            SongState::Queued => "QUEUED",
            SongState::Playing => "PLAYING",
            SongState::Played => "PLAYED",
            SongState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for SongState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_APPROVAL" => Ok(SongState::PendingApproval),
            "QUEUED" => Ok(SongState::Queued),
            "PLAYING" => Ok(SongState::Playing),
            "PLAYED" => Ok(SongState::Played),
            "REJECTED" => Ok(SongState::Rejected),
            other => Err(Error::InvalidInput(format!("Unknown song state: {other}"))),
        }
    }
}

/// Staff role resolved by the upstream auth layer
///
/// This service never checks credentials; it only decides whether an
/// already-resolved role is permitted to perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Bartender,
    Cashier,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Bartender => "bartender",
            StaffRole::Cashier => "cashier",
        }
    }

    /// Roles allowed to operate the song queue (approve is admin-only)
    pub fn can_operate_queue(&self) -> bool {
        matches!(self, StaffRole::Admin | StaffRole::Bartender)
    }
}

impl FromStr for StaffRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(StaffRole::Admin),
            "bartender" => Ok(StaffRole::Bartender),
            "cashier" => Ok(StaffRole::Cashier),
            other => Err(Error::InvalidInput(format!("Unknown staff role: {other}"))),
        }
    }
}

/// Event lifecycle state on the singleton config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EventState {
    Preparation,
    Active,
    Finished,
}

impl FromStr for EventState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preparation" => Ok(EventState::Preparation),
            "active" => Ok(EventState::Active),
            "finished" => Ok(EventState::Finished),
            other => Err(Error::InvalidInput(format!("Unknown event state: {other}"))),
        }
    }
}

/// Admin-configured time-of-day interval with a percentage price reduction
///
/// Times are zero-padded 24h "HH:MM" strings with no date component; a
/// window never crosses midnight (`end_time > start_time` is enforced by
/// validation before any write).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountWindow {
    pub start_time: String,
    pub end_time: String,
    pub percentage: f64,
    pub label: String,
}

/// Display info for a Yape/Plin account shown on the public request page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_url: Option<String>,
}

/// Display info for a bank transfer destination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankTransferAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cci: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
}

/// Payment destinations displayed to attendees; not business-logic bearing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentAccounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yape: Option<PaymentAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plin: Option<PaymentAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_transfer: Option<BankTransferAccount>,
}

/// A song request row
///
/// `queue_order` is only meaningful within the `(tier, QUEUED)` partition;
/// `votes`/`voter_ids` only for FREE songs. `amount_due` is a snapshot of
/// the tier price at creation time, never recomputed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Song {
    pub guid: String,
    pub title: String,
    pub artist: String,
    pub requester_name: String,
    #[serde(skip_serializing)]
    pub requester_ip: String,
    pub tier: SongTier,
    pub state: SongState,
    pub queue_order: i64,
    pub votes: i64,
    /// JSON array of opaque device identifiers that have voted
    #[serde(skip_serializing)]
    pub voter_ids: String,
    pub amount_due: f64,
    pub paid_confirmed: bool,
    pub proof_url: Option<String>,
    #[serde(skip_serializing)]
    pub proof_key: Option<String>,
    pub dedication_from: Option<String>,
    pub dedication_to: Option<String>,
    pub dedication_message: Option<String>,
    pub played_at: Option<chrono::DateTime<chrono::Utc>>,
    pub wait_minutes: Option<i64>,
    pub dj_notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Song {
    /// Decode the voter set from its JSON column
    pub fn voters(&self) -> Vec<String> {
        serde_json::from_str(&self.voter_ids).unwrap_or_default()
    }

    /// Whether a device has already voted for this song
    pub fn has_voted(&self, device_id: &str) -> bool {
        self.voters().iter().any(|v| v == device_id)
    }
}

/// The singleton configuration row (id is always "singleton")
///
/// Nested values (`discount_windows`, `payment_accounts`) are JSON-encoded
/// TEXT columns; use the decode helpers rather than touching the raw text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConfigRow {
    pub id: String,
    pub discounts_enabled: bool,
    pub discount_windows: String,
    pub price_free: f64,
    pub price_priority: f64,
    pub price_vip: f64,
    pub payment_accounts: String,
    pub event_name: String,
    pub event_date: String,
    pub event_start_time: String,
    pub event_end_time: String,
    pub event_max_capacity: i64,
    pub event_state: EventState,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ConfigRow {
    /// Decode the configured discount windows
    pub fn windows(&self) -> Vec<DiscountWindow> {
        serde_json::from_str(&self.discount_windows).unwrap_or_default()
    }

    /// Decode the payment-accounts display info
    pub fn accounts(&self) -> PaymentAccounts {
        serde_json::from_str(&self.payment_accounts).unwrap_or_default()
    }

    /// Snapshot price for a tier, used as `amount_due` at song creation
    pub fn price_for(&self, tier: SongTier) -> f64 {
        match tier {
            SongTier::Free => self.price_free,
            SongTier::Priority => self.price_priority,
            SongTier::Vip => self.price_vip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_capability_table() {
        assert!(!SongTier::Free.requires_approval());
        assert!(!SongTier::Free.requires_proof());
        assert!(SongTier::Free.supports_voting());
        assert!(!SongTier::Free.supports_dedication());

        assert!(SongTier::Priority.requires_approval());
        assert!(SongTier::Priority.requires_proof());
        assert!(!SongTier::Priority.supports_voting());
        assert!(!SongTier::Priority.supports_dedication());

        assert!(SongTier::Vip.requires_approval());
        assert!(SongTier::Vip.requires_proof());
        assert!(!SongTier::Vip.supports_voting());
        assert!(SongTier::Vip.supports_dedication());
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in [SongTier::Free, SongTier::Priority, SongTier::Vip] {
            assert_eq!(tier.as_str().parse::<SongTier>().unwrap(), tier);
        }
        assert!("LIBRE".parse::<SongTier>().is_err());
    }

    #[test]
    fn test_state_round_trip() {
        for state in [
            SongState::PendingApproval,
            SongState::Queued,
            SongState::Playing,
            SongState::Played,
            SongState::Rejected,
        ] {
            assert_eq!(state.as_str().parse::<SongState>().unwrap(), state);
        }
        assert!("DANCING".parse::<SongState>().is_err());
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Admin".parse::<StaffRole>().unwrap(), StaffRole::Admin);
        assert_eq!("BARTENDER".parse::<StaffRole>().unwrap(), StaffRole::Bartender);
        assert!("dj".parse::<StaffRole>().is_err());
    }

    #[test]
    fn test_payment_accounts_default_decodes_from_empty_object() {
        let accounts: PaymentAccounts = serde_json::from_str("{}").unwrap();
        assert_eq!(accounts, PaymentAccounts::default());
    }
}
