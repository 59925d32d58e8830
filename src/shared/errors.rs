//! Error types shared across the service
//!
//! `DomainError` carries every business-rule violation the reservation
//! lifecycle can produce; `InfraError` wraps failures of the outside world;
//! `AppError` is the top-level union handed to the binary.

use rust_decimal::Decimal;
use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Car {car_id} does not belong to user {user_id}")]
    CarNotOwned { car_id: i32, user_id: i32 },

    #[error("Car {car_id} already has an open reservation")]
    ActiveReservationExists { car_id: i32 },

    #[error("Parking zone {zone_id} has no free spots")]
    ZoneFull { zone_id: i32 },

    #[error("Parking spot {spot_id} is not available")]
    SpotUnavailable { spot_id: i32 },

    #[error("Parking spot {spot_id} is {status}, cannot occupy")]
    InvalidSpotTransition { spot_id: i32, status: String },

    #[error("QR token is invalid")]
    InvalidToken,

    #[error("QR token has expired")]
    ExpiredToken,

    #[error("Scanned plate does not match the reservation")]
    PlateMismatch,

    #[error("Invalid license plate format: {0}")]
    InvalidPlateFormat(String),

    #[error("Invalid reservation state: {0}")]
    InvalidState(String),

    #[error("Exit time precedes entry time")]
    InvalidInterval,

    #[error("{0}")]
    PaymentFailed(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Store or other infrastructure failure surfaced through a domain
    /// operation. Maps to a 500, never to a client-correctable status.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payment-recorder rejections. Every message carries the `Payment:` prefix
/// so callers matching on message text keep working after the error crosses
/// a boundary as a plain string.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment: reservation {0} not found")]
    ReservationNotFound(i32),

    #[error("Payment: parking session {0} is not completed")]
    SessionNotCompleted(i32),

    #[error("Payment: reservation {0} is already paid")]
    AlreadyPaid(i32),

    #[error("Payment: invalid payment amount {0}")]
    InvalidAmount(Decimal),

    #[error("Payment: {0}")]
    Rejected(String),
}

impl From<PaymentError> for DomainError {
    fn from(e: PaymentError) -> Self {
        DomainError::PaymentFailed(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_errors_carry_the_payment_prefix() {
        let cases: Vec<PaymentError> = vec![
            PaymentError::ReservationNotFound(7),
            PaymentError::SessionNotCompleted(7),
            PaymentError::AlreadyPaid(7),
            PaymentError::InvalidAmount(Decimal::ZERO),
            PaymentError::Rejected("card declined".to_string()),
        ];
        for e in cases {
            assert!(e.to_string().starts_with("Payment: "), "{}", e);
        }
    }

    #[test]
    fn payment_error_converts_to_payment_failed() {
        let err: DomainError = PaymentError::AlreadyPaid(3).into();
        match err {
            DomainError::PaymentFailed(msg) => {
                assert!(msg.starts_with("Payment: "));
                assert!(msg.contains('3'));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn not_found_formats_entity_and_key() {
        let err = DomainError::NotFound {
            entity: "reservation",
            field: "id",
            value: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Not found: reservation with id=42");
    }
}
