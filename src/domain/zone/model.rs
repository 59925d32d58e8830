//! Parking zone and spot domain entities

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Parking spot status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpotStatus {
    /// Free and assignable
    Available,
    /// Held by a not-yet-started reservation
    Reserved,
    /// A car is parked on it
    Occupied,
    /// Temporarily closed for service
    Maintenance,
    /// Permanently out of rotation
    OutOfService,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Reserved => "Reserved",
            Self::Occupied => "Occupied",
            Self::Maintenance => "Maintenance",
            Self::OutOfService => "OutOfService",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Available" => Self::Available,
            "Reserved" => Self::Reserved,
            "Occupied" => Self::Occupied,
            "Maintenance" => Self::Maintenance,
            // Unknown statuses must never be handed out
            _ => Self::OutOfService,
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A managed collection of spots sharing one hourly rate
#[derive(Debug, Clone)]
pub struct ParkingZone {
    pub id: i32,
    pub name: String,
    pub total_floors: i32,
    pub spots_per_floor: i32,
    /// Rate charged per started hour of parking
    pub hourly_rate: Decimal,
    /// Cached "no Available spots left" flag, refreshed by occupancy queries
    pub is_full: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ParkingZone {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        total_floors: i32,
        spots_per_floor: i32,
        hourly_rate: Decimal,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            total_floors,
            spots_per_floor,
            hourly_rate,
            is_full: false,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn capacity(&self) -> i32 {
        self.total_floors * self.spots_per_floor
    }
}

/// A single physical parking space, identified by zone + floor + number
#[derive(Debug, Clone)]
pub struct ParkingSpot {
    pub id: i32,
    pub zone_id: i32,
    /// Label like `F2S14`: floor 2, spot 14
    pub spot_number: String,
    pub floor: i32,
    pub status: SpotStatus,
    /// The non-terminal reservation currently holding this spot, if any
    pub reservation_id: Option<i32>,
}

impl ParkingSpot {
    pub fn new(id: i32, zone_id: i32, floor: i32, number_on_floor: i32) -> Self {
        Self {
            id,
            zone_id,
            spot_number: Self::label(floor, number_on_floor),
            floor,
            status: SpotStatus::Available,
            reservation_id: None,
        }
    }

    /// Spot label as printed on the floor: `F{floor}S{number}`
    pub fn label(floor: i32, number_on_floor: i32) -> String {
        format!("F{}S{}", floor, number_on_floor)
    }

    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available
    }
}

// ── Tests ──────────────────────────────────────────────────────
