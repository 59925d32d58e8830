//! Car DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::car::Car;
use crate::shared::validations::validate_plate_format;

/// Request to register a car under the calling user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterCarRequest {
    /// License plate, three letters + four digits (e.g. `ABC1234`)
    #[validate(custom(function = "validate_plate_format"))]
    pub plate_number: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(length(min = 1, max = 50))]
    pub color: String,
}

/// Car details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct CarDto {
    pub id: i32,
    pub plate_number: String,
    pub model: String,
    pub color: String,
    pub created_at: String,
}

impl From<Car> for CarDto {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            plate_number: car.plate_number,
            model: car.model,
            color: car.color,
            created_at: car.created_at.to_rfc3339(),
        }
    }
}
