//! Notification events
//!
//! Defines the events published when reservations change state. A delivery
//! worker (mail, push) subscribes to the bus and turns these into messages;
//! the service itself only publishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// Reservation created, QR token issued
    ReservationCreated(ReservationCreatedEvent),
    /// Reservation cancelled by the user or the expiry sweep
    ReservationCancelled(ReservationCancelledEvent),
    /// Hold is about to be auto-cancelled
    ReservationCancellationWarning(ReservationCancellationWarningEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ReservationCreated(_) => "reservation_created",
            Event::ReservationCancelled(_) => "reservation_cancelled",
            Event::ReservationCancellationWarning(_) => "reservation_cancellation_warning",
        }
    }

    /// Notification address the event is routed to
    pub fn email(&self) -> &str {
        match self {
            Event::ReservationCreated(e) => &e.email,
            Event::ReservationCancelled(e) => &e.email,
            Event::ReservationCancellationWarning(e) => &e.email,
        }
    }
}

/// Reservation created event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: i32,
    pub user_id: i32,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// Token the consumer renders as a QR code
    pub qr_token: String,
}

/// Reservation cancelled event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCancelledEvent {
    pub reservation_id: i32,
    pub parking_zone_name: String,
    pub email: String,
    pub cancelled_at: DateTime<Utc>,
}

/// Upcoming auto-cancellation warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCancellationWarningEvent {
    pub email: String,
    /// When the hold will be cancelled if the car does not arrive
    pub cancellation_time: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::ReservationCancellationWarning(ReservationCancellationWarningEvent {
            email: "driver@example.com".to_string(),
            cancellation_time: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ReservationCancellationWarning");
        assert_eq!(json["data"]["email"], "driver@example.com");
    }

    #[test]
    fn event_message_carries_id_and_flattened_event() {
        let event = Event::ReservationCreated(ReservationCreatedEvent {
            reservation_id: 5,
            user_id: 2,
            email: "driver@example.com".to_string(),
            created_at: Utc::now(),
            qr_token: "token".to_string(),
        });

        let msg = EventMessage::new(event);
        assert!(!msg.id.is_empty());

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "ReservationCreated");
        assert_eq!(json["data"]["reservation_id"], 5);
    }
}
