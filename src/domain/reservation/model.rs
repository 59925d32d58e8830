//! Reservation domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Spot held, car not yet arrived
    Reserved,
    /// Car checked in, parking in progress
    Active,
    /// Checked out and paid
    Completed,
    /// Cancelled by the user or by the expiry sweep
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "Reserved",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Reserved" => Self::Reserved,
            "Active" => Self::Active,
            "Completed" => Self::Completed,
            _ => Self::Cancelled,
        }
    }

    /// Completed and Cancelled admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spot hold that becomes a parking session on check-in.
///
/// References are plain ids; callers resolve the car, spot and zone through
/// their repositories instead of navigating object graphs.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub car_id: i32,
    pub spot_id: i32,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, at check-in
    pub entry_time: Option<DateTime<Utc>>,
    /// Set at first check-out attempt; a retried check-out reuses it
    pub exit_time: Option<DateTime<Utc>>,
    /// Parking fee or cancellation fee, absent until one is computed
    pub total_amount: Option<Decimal>,
    /// Self-verifying gate token, written right after the row gets its id
    pub qr_token: String,
    pub is_paid: bool,
    pub status: SessionStatus,
}

impl Reservation {
    pub fn new(user_id: i32, car_id: i32, spot_id: i32) -> Self {
        Self {
            id: 0,
            user_id,
            car_id,
            spot_id,
            created_at: Utc::now(),
            entry_time: None,
            exit_time: None,
            total_amount: None,
            qr_token: String::new(),
            is_paid: false,
            status: SessionStatus::Reserved,
        }
    }

    /// Reserved or Active: the reservation still ties up a car and a spot
    pub fn is_open(&self) -> bool {
        matches!(self.status, SessionStatus::Reserved | SessionStatus::Active)
    }

    /// Hold age against the auto-cancellation deadline
    pub fn expires_at(&self, hold_expiry_hours: i64) -> DateTime<Utc> {
        self.created_at + chrono::Duration::hours(hold_expiry_hours)
    }
}

// ── Tests ──────────────────────────────────────────────────────
