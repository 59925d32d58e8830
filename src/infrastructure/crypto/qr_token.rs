//! QR gate-token codec
//!
//! Produces the self-verifying token printed into reservation QR codes.
//! The token carries `{reservationId}:{userId}:{issuedAtTicks}` plus an
//! HMAC-SHA256 over those three fields, so the gate can authenticate a
//! scan without any server-side token table. Nothing here checks token
//! age: freshness is a reservation rule, enforced by the caller.
//!
//! Wire format: `base64url( "id:user:ticks:" + base64(hmac) )`, unpadded.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::shared::errors::{DomainError, DomainResult, InfraError};

type HmacSha256 = Hmac<Sha256>;

/// Minimum HMAC key size: 128 bits
const MIN_KEY_BYTES: usize = 16;

/// Claims carried inside a gate token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPayload {
    pub reservation_id: i32,
    pub user_id: i32,
    pub issued_at: DateTime<Utc>,
}

/// Stateless token codec bound to one process-wide secret.
///
/// Rotating the secret invalidates every outstanding token, which is
/// acceptable: tokens expire within a day anyway.
#[derive(Clone)]
pub struct QrTokenCodec {
    mac: HmacSha256,
}

impl QrTokenCodec {
    /// Build the codec from a hex-encoded secret of at least 128 bits
    pub fn new(secret_hex: &str) -> Result<Self, InfraError> {
        let key = hex::decode(secret_hex.trim())
            .map_err(|e| InfraError::Crypto(format!("QR secret is not valid hex: {}", e)))?;
        if key.len() < MIN_KEY_BYTES {
            return Err(InfraError::Crypto(format!(
                "QR secret too short: {} bytes, need at least {}",
                key.len(),
                MIN_KEY_BYTES
            )));
        }
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| InfraError::Crypto(format!("cannot initialize HMAC: {}", e)))?;
        Ok(Self { mac })
    }

    /// Encode a token for a reservation
    pub fn generate(
        &self,
        reservation_id: i32,
        user_id: i32,
        issued_at: DateTime<Utc>,
    ) -> String {
        let ticks = issued_at.timestamp_nanos_opt().unwrap_or_default();
        let payload = format!("{}:{}:{}", reservation_id, user_id, ticks);
        let tag = self.sign(payload.as_bytes());
        let full = format!("{}:{}", payload, STANDARD.encode(tag));
        URL_SAFE_NO_PAD.encode(full.as_bytes())
    }

    /// Structural + signature check. Malformed input is simply `false`,
    /// never an error: gate scanners feed this raw user input.
    pub fn validate(&self, token: &str) -> bool {
        let inner = match decode_outer(token) {
            Some(s) => s,
            None => return false,
        };
        let fields: Vec<&str> = inner.split(':').collect();
        if fields.len() != 4 {
            return false;
        }
        let tag = match STANDARD.decode(fields[3]) {
            Ok(t) => t,
            Err(_) => return false,
        };
        let payload = format!("{}:{}:{}", fields[0], fields[1], fields[2]);

        // verify_slice is constant-time
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag).is_ok()
    }

    /// Verify and parse. Anything a hostile scanner could have produced
    /// comes back as `InvalidToken`.
    pub fn decode(&self, token: &str) -> DomainResult<TokenPayload> {
        if !self.validate(token) {
            return Err(DomainError::InvalidToken);
        }
        let inner = decode_outer(token).ok_or(DomainError::InvalidToken)?;
        let fields: Vec<&str> = inner.split(':').collect();
        if fields.len() != 4 {
            return Err(DomainError::InvalidToken);
        }

        let reservation_id: i32 = fields[0].parse().map_err(|_| DomainError::InvalidToken)?;
        let user_id: i32 = fields[1].parse().map_err(|_| DomainError::InvalidToken)?;
        let ticks: i64 = fields[2].parse().map_err(|_| DomainError::InvalidToken)?;

        Ok(TokenPayload {
            reservation_id,
            user_id,
            issued_at: DateTime::from_timestamp_nanos(ticks),
        })
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Reverse the URL-safe outer encoding. Tolerates padded input since some
/// QR libraries re-add `=` when rendering.
fn decode_outer(token: &str) -> Option<String> {
    let stripped = token.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(stripped).ok()?;
    String::from_utf8(bytes).ok()
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn codec() -> QrTokenCodec {
        QrTokenCodec::new(TEST_SECRET).unwrap()
    }

    #[test]
    fn round_trip_preserves_all_claims() {
        let c = codec();
        let issued = Utc::now();
        let token = c.generate(42, 7, issued);
        let payload = c.decode(&token).unwrap();
        assert_eq!(payload.reservation_id, 42);
        assert_eq!(payload.user_id, 7);
        assert_eq!(payload.issued_at, issued);
    }

    #[test]
    fn generated_token_is_url_safe() {
        let c = codec();
        let token = c.generate(123456, 654321, Utc::now());
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
        assert!(c.validate(&token));
    }

    #[test]
    fn padded_token_still_validates() {
        let c = codec();
        let mut token = c.generate(1, 2, Utc::now());
        token.push('=');
        assert!(c.validate(&token));
        assert!(c.decode(&token).is_ok());
    }

    #[test]
    fn flipping_any_character_invalidates() {
        let c = codec();
        let token = c.generate(42, 7, Utc::now());
        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            if tampered == token {
                continue;
            }
            assert!(!c.validate(&tampered), "flip at {} slipped through", i);
        }
    }

    #[test]
    fn garbage_is_rejected_not_panicking() {
        let c = codec();
        for junk in ["", "???", "not base64 at all!", "YWJj", "οδός"] {
            assert!(!c.validate(junk));
            assert!(matches!(
                c.decode(junk),
                Err(DomainError::InvalidToken)
            ));
        }
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let c = codec();
        // inner text with only three fields, no MAC
        let forged = URL_SAFE_NO_PAD.encode(b"1:2:3");
        assert!(!c.validate(&forged));
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let c1 = codec();
        let c2 = QrTokenCodec::new(
            "ffeeddccbbaa99887766554433221100ffeeddccbbaa99887766554433221100",
        )
        .unwrap();
        let token = c2.generate(42, 7, Utc::now());
        assert!(!c1.validate(&token));
        assert!(c2.validate(&token));
    }

    #[test]
    fn short_or_malformed_secret_is_refused() {
        assert!(QrTokenCodec::new("abcd").is_err()); // 2 bytes
        assert!(QrTokenCodec::new("not-hex").is_err());
        // exactly 16 bytes passes
        assert!(QrTokenCodec::new("00112233445566778899aabbccddeeff").is_ok());
    }

    #[test]
    fn explicit_timestamp_survives_the_tick_encoding() {
        use chrono::TimeZone;
        let c = codec();
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 45).unwrap();
        let payload = c.decode(&c.generate(9, 9, issued)).unwrap();
        assert_eq!(payload.issued_at, issued);
    }
}
