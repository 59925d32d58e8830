//! Request and domain-level validation helpers

use validator::ValidationError;

/// License plates are three uppercase letters followed by four digits,
/// e.g. `ABC1234`. Exactly seven characters, nothing else accepted.
pub fn is_valid_plate(plate: &str) -> bool {
    let bytes = plate.as_bytes();
    bytes.len() == 7
        && bytes[..3].iter().all(|b| b.is_ascii_uppercase())
        && bytes[3..].iter().all(|b| b.is_ascii_digit())
}

/// `validator` hook for request DTOs carrying a plate number.
pub fn validate_plate_format(plate: &str) -> Result<(), ValidationError> {
    if is_valid_plate(plate) {
        Ok(())
    } else {
        Err(ValidationError::new("plate_format"))
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_plates() {
        for plate in ["ABC1234", "ZZZ0000", "KGZ9876"] {
            assert!(is_valid_plate(plate), "{plate} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_plates() {
        for plate in [
            "abc1234",  // lowercase letters
            "AB1234",   // too short
            "ABC12345", // too long
            "1BC1234",  // digit where a letter belongs
            "ABCD234",  // letter where a digit belongs
            "ABC 123",  // whitespace
            "",
            "ÄBC1234", // non-ascii letter
        ] {
            assert!(!is_valid_plate(plate), "{plate} should be invalid");
        }
    }

    #[test]
    fn validator_hook_maps_to_validation_error() {
        assert!(validate_plate_format("ABC1234").is_ok());
        let err = validate_plate_format("nope").unwrap_err();
        assert_eq!(err.code, "plate_format");
    }
}
