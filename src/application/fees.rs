//! Fee calculation
//!
//! Pure money math, no I/O. All amounts are `Decimal`; durations come in as
//! chrono types and never leave this module.
//!
//! Rules:
//! - Parking is billed per started hour: any partial hour rounds up, a
//!   zero-length stay costs nothing.
//! - Cancellation is free for never-paid holds and inside the grace
//!   window (15 minutes by default); after that it costs 20% of the
//!   hourly rate per whole elapsed hour.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::{DomainError, DomainResult};

/// Share of the hourly rate charged per elapsed hour on cancellation
fn cancellation_rate() -> Decimal {
    // 0.2
    Decimal::new(2, 1)
}

/// Parking fee for a completed stay: `ceil(duration in hours) × rate`.
///
/// `exit_time` earlier than `entry_time` is an invariant violation upstream
/// guards should have prevented, reported as `InvalidInterval`.
pub fn parking_fee(
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
    hourly_rate: Decimal,
) -> DomainResult<Decimal> {
    let duration = exit_time - entry_time;
    if duration < Duration::zero() {
        return Err(DomainError::InvalidInterval);
    }

    if duration.is_zero() {
        return Ok(Decimal::ZERO);
    }

    const NANOS_PER_HOUR: i64 = 3_600_000_000_000;
    // Started hours: a nanosecond into an hour already bills the full hour
    let hours = match duration.num_nanoseconds() {
        Some(ns) => (ns + NANOS_PER_HOUR - 1) / NANOS_PER_HOUR,
        // i64 nanoseconds overflow past ~292 years; whole seconds suffice there
        None => (duration.num_seconds() + 3599) / 3600,
    };
    Ok(Decimal::from(hours) * hourly_rate)
}

/// Cancellation fee for a not-yet-started hold.
///
/// Only previously-paid reservations are charged; the penalty counts whole
/// hours since creation (floor, not ceil) at 20% of the zone rate each.
/// `grace_minutes` comes from `[reservations]` config (default 15).
pub fn cancellation_fee(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    hourly_rate: Decimal,
    is_paid: bool,
    grace_minutes: i64,
) -> Decimal {
    if !is_paid {
        return Decimal::ZERO;
    }

    let elapsed = now - created_at;
    if elapsed <= Duration::minutes(grace_minutes) {
        return Decimal::ZERO;
    }

    let whole_hours = elapsed.num_hours().max(0);
    cancellation_rate() * hourly_rate * Decimal::from(whole_hours)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn one_minute_bills_a_full_hour() {
        let fee = parking_fee(at(10, 0), at(10, 1), dec("5.00")).unwrap();
        assert_eq!(fee, dec("5.00"));
    }

    #[test]
    fn exact_hours_bill_exactly() {
        let fee = parking_fee(at(10, 0), at(12, 0), dec("5.00")).unwrap();
        assert_eq!(fee, dec("10.00"));
    }

    #[test]
    fn an_hour_and_a_minute_bills_two_hours() {
        let fee = parking_fee(at(10, 0), at(11, 1), dec("5.00")).unwrap();
        assert_eq!(fee, dec("10.00"));
    }

    #[test]
    fn zero_duration_is_free() {
        let fee = parking_fee(at(10, 0), at(10, 0), dec("5.00")).unwrap();
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn sub_second_stay_still_bills_one_hour() {
        let entry = at(10, 0);
        let exit = entry + Duration::milliseconds(500);
        let fee = parking_fee(entry, exit, dec("5.00")).unwrap();
        assert_eq!(fee, dec("5.00"));
    }

    #[test]
    fn sub_millisecond_stay_still_bills_one_hour() {
        let entry = at(10, 0);
        let exit = entry + Duration::microseconds(400);
        let fee = parking_fee(entry, exit, dec("5.00")).unwrap();
        assert_eq!(fee, dec("5.00"));
    }

    #[test]
    fn exit_before_entry_is_invalid() {
        let err = parking_fee(at(12, 0), at(10, 0), dec("5.00")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInterval));
    }

    #[test]
    fn fractional_rate_multiplies_exactly() {
        let fee = parking_fee(at(10, 0), at(13, 0), dec("2.50")).unwrap();
        assert_eq!(fee, dec("7.50"));
    }

    const GRACE: i64 = 15;

    #[test]
    fn cancellation_is_free_when_never_paid() {
        let created = at(8, 0);
        let fee = cancellation_fee(
            created,
            created + Duration::hours(30),
            dec("10.00"),
            false,
            GRACE,
        );
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn cancellation_within_grace_is_free() {
        let created = at(8, 0);
        let fee = cancellation_fee(
            created,
            created + Duration::minutes(5),
            dec("10.00"),
            true,
            GRACE,
        );
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn grace_boundary_is_inclusive() {
        let created = at(8, 0);
        let fee = cancellation_fee(
            created,
            created + Duration::minutes(15),
            dec("10.00"),
            true,
            GRACE,
        );
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn widened_grace_window_is_honored() {
        // 45m elapsed is past the default window but inside a 60m one
        let created = at(8, 0);
        let now = created + Duration::minutes(45);
        assert_eq!(cancellation_fee(created, now, dec("10.00"), true, 60), Decimal::ZERO);
    }

    #[test]
    fn paid_cancellation_charges_per_whole_hour() {
        // 2h10m elapsed → 2 whole hours → 0.2 × 10.00 × 2 = 4.00
        let created = at(8, 0);
        let now = created + Duration::hours(2) + Duration::minutes(10);
        let fee = cancellation_fee(created, now, dec("10.00"), true, GRACE);
        assert_eq!(fee, dec("4.00"));
    }

    #[test]
    fn paid_cancellation_under_one_hour_past_grace_is_zero() {
        // 30m elapsed: past grace but zero whole hours → no charge
        let created = at(8, 0);
        let fee = cancellation_fee(
            created,
            created + Duration::minutes(30),
            dec("10.00"),
            true,
            GRACE,
        );
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn cancellation_fee_is_never_negative() {
        // clock skew: "now" before created_at
        let created = at(8, 0);
        let fee = cancellation_fee(created, created - Duration::hours(1), dec("10.00"), true, GRACE);
        assert_eq!(fee, Decimal::ZERO);
    }
}
