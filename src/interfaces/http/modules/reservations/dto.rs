//! Reservation DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::car::Car;
use crate::domain::reservation::Reservation;
use crate::domain::zone::ParkingSpot;
use crate::shared::validations::validate_plate_format;

/// Request to reserve a spot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    pub car_id: i32,
    pub spot_id: i32,
    pub zone_id: i32,
}

/// Entry-gate check-in request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartParkingRequest {
    /// Plate as read by the gate camera
    #[validate(custom(function = "validate_plate_format"))]
    pub plate_number: String,
    /// QR token handed out at reservation time
    #[validate(length(min = 1))]
    pub qr_code: String,
}

/// Exit-gate check-out request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EndParkingRequest {
    #[validate(custom(function = "validate_plate_format"))]
    pub plate_number: String,
    #[validate(length(min = 1))]
    pub qr_code: String,
    /// `Cash`, `Card` or `Online`; anything else is rejected
    pub payment_method: String,
}

/// Car summary nested in a reservation
#[derive(Debug, Serialize, ToSchema)]
pub struct CarView {
    pub id: i32,
    pub plate_number: String,
    pub model: String,
}

/// Spot summary nested in a reservation
#[derive(Debug, Serialize, ToSchema)]
pub struct SpotView {
    pub id: i32,
    pub zone_id: i32,
    pub spot_number: String,
    pub floor: i32,
}

/// Reservation details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    pub id: i32,
    pub status: String,
    pub created_at: String,
    pub entry_time: Option<String>,
    pub exit_time: Option<String>,
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Decimal>,
    pub qr_token: String,
    pub is_paid: bool,
    pub car: Option<CarView>,
    pub spot: Option<SpotView>,
}

impl ReservationDto {
    pub fn assemble(
        reservation: Reservation,
        car: Option<Car>,
        spot: Option<ParkingSpot>,
    ) -> Self {
        Self {
            id: reservation.id,
            status: reservation.status.to_string(),
            created_at: reservation.created_at.to_rfc3339(),
            entry_time: reservation.entry_time.map(|t| t.to_rfc3339()),
            exit_time: reservation.exit_time.map(|t| t.to_rfc3339()),
            total_amount: reservation.total_amount,
            qr_token: reservation.qr_token,
            is_paid: reservation.is_paid,
            car: car.map(|c| CarView {
                id: c.id,
                plate_number: c.plate_number,
                model: c.model,
            }),
            spot: spot.map(|s| SpotView {
                id: s.id,
                zone_id: s.zone_id,
                spot_number: s.spot_number,
                floor: s.floor,
            }),
        }
    }
}

/// Fee quote for an open reservation
#[derive(Debug, Serialize, ToSchema)]
pub struct FeeDto {
    pub reservation_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
}
