//! Payment domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Payment processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Recorded but not yet charged
    Pending,
    /// Charged successfully
    Completed,
    /// Charge attempt rejected
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Completed" => Self::Completed,
            _ => Self::Failed,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the parking fee was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::Online => "Online",
        }
    }

    /// Parses client input; unknown methods are rejected, not defaulted
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Cash" => Some(Self::Cash),
            "Card" => Some(Self::Card),
            "Online" => Some(Self::Online),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement record for one reservation (1:1)
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: i32,
    pub reservation_id: i32,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(reservation_id: i32, amount: Decimal, method: PaymentMethod) -> Self {
        Self {
            id: 0,
            reservation_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the charge as settled
    pub fn complete(&mut self) {
        self.status = PaymentStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the charge as rejected
    pub fn fail(&mut self) {
        self.status = PaymentStatus::Failed;
        self.completed_at = None;
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_payment_is_pending() {
        let p = Payment::new(1, Decimal::from(10), PaymentMethod::Card);
        assert_eq!(p.status, PaymentStatus::Pending);
        assert!(p.completed_at.is_none());
    }

    #[test]
    fn complete_sets_timestamp() {
        let mut p = Payment::new(1, Decimal::from(10), PaymentMethod::Card);
        p.complete();
        assert_eq!(p.status, PaymentStatus::Completed);
        assert!(p.completed_at.is_some());
    }

    #[test]
    fn method_parsing_rejects_unknown() {
        assert_eq!(PaymentMethod::from_str("Card"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::from_str("Cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_str("Crypto"), None);
    }

    #[test]
    fn status_string_roundtrip() {
        for status in &[
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(&PaymentStatus::from_str(status.as_str()), status);
        }
    }
}
