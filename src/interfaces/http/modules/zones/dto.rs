//! Zone and spot DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::{FloorAvailability, ZoneStatus};
use crate::domain::zone::{ParkingSpot, ParkingZone};

/// Request to create a zone with its spot grid
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateZoneRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1, max = 50))]
    pub total_floors: i32,
    #[validate(range(min = 1, max = 500))]
    pub spots_per_floor: i32,
    /// Hourly parking rate, must be positive
    pub hourly_rate: Decimal,
    pub description: Option<String>,
}

/// Zone details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ZoneDto {
    pub id: i32,
    pub name: String,
    pub total_floors: i32,
    pub spots_per_floor: i32,
    #[schema(value_type = String)]
    pub hourly_rate: Decimal,
    pub is_full: bool,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<ParkingZone> for ZoneDto {
    fn from(zone: ParkingZone) -> Self {
        Self {
            id: zone.id,
            name: zone.name,
            total_floors: zone.total_floors,
            spots_per_floor: zone.spots_per_floor,
            hourly_rate: zone.hourly_rate,
            is_full: zone.is_full,
            description: zone.description,
            created_at: zone.created_at.to_rfc3339(),
        }
    }
}

/// Spot details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct SpotDto {
    pub id: i32,
    pub zone_id: i32,
    pub spot_number: String,
    pub floor: i32,
    pub status: String,
    pub reservation_id: Option<i32>,
}

impl From<ParkingSpot> for SpotDto {
    fn from(spot: ParkingSpot) -> Self {
        Self {
            id: spot.id,
            zone_id: spot.zone_id,
            spot_number: spot.spot_number,
            floor: spot.floor,
            status: spot.status.to_string(),
            reservation_id: spot.reservation_id,
        }
    }
}

/// Occupancy breakdown of one zone
#[derive(Debug, Serialize, ToSchema)]
pub struct ZoneStatusDto {
    pub zone_id: i32,
    pub name: String,
    pub total_spots: u64,
    pub available: u64,
    pub reserved: u64,
    pub occupied: u64,
    pub maintenance: u64,
    pub out_of_service: u64,
    pub is_full: bool,
    pub available_per_floor: Vec<FloorAvailabilityDto>,
}

/// Available count on one floor
#[derive(Debug, Serialize, ToSchema)]
pub struct FloorAvailabilityDto {
    pub floor: i32,
    pub available: u64,
}

impl From<FloorAvailability> for FloorAvailabilityDto {
    fn from(f: FloorAvailability) -> Self {
        Self {
            floor: f.floor,
            available: f.available,
        }
    }
}

impl From<ZoneStatus> for ZoneStatusDto {
    fn from(status: ZoneStatus) -> Self {
        Self {
            zone_id: status.zone_id,
            name: status.name,
            total_spots: status.total_spots,
            available: status.available,
            reserved: status.reserved,
            occupied: status.occupied,
            maintenance: status.maintenance,
            out_of_service: status.out_of_service,
            is_full: status.is_full,
            available_per_floor: status
                .available_per_floor
                .into_iter()
                .map(FloorAvailabilityDto::from)
                .collect(),
        }
    }
}
