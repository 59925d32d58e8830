//! Car domain entity

use chrono::{DateTime, Utc};

/// Registered vehicle. The plate number is the physical credential scanned
/// at the gate, stored uppercase in `AAA0000` form.
#[derive(Debug, Clone)]
pub struct Car {
    pub id: i32,
    /// Owning user
    pub user_id: i32,
    /// Unique license plate, three letters + four digits
    pub plate_number: String,
    pub model: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Car {
    pub fn new(
        id: i32,
        user_id: i32,
        plate_number: impl Into<String>,
        model: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            plate_number: plate_number.into().to_uppercase(),
            model: model.into(),
            color: color.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }

    /// Case-insensitive plate comparison, used when matching a scanned plate
    /// against the reservation's car.
    pub fn plate_matches(&self, scanned: &str) -> bool {
        self.plate_number.eq_ignore_ascii_case(scanned)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_is_normalized_to_uppercase() {
        let car = Car::new(1, 10, "abc1234", "Model 3", "white");
        assert_eq!(car.plate_number, "ABC1234");
    }

    #[test]
    fn plate_match_ignores_case() {
        let car = Car::new(1, 10, "ABC1234", "Model 3", "white");
        assert!(car.plate_matches("abc1234"));
        assert!(car.plate_matches("ABC1234"));
        assert!(!car.plate_matches("ABC1235"));
    }

    #[test]
    fn ownership_check() {
        let car = Car::new(1, 10, "ABC1234", "Model 3", "white");
        assert!(car.is_owned_by(10));
        assert!(!car.is_owned_by(11));
    }
}
