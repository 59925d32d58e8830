//! Reservation lifecycle
//!
//! `ReservationService` owns every state transition a reservation can make:
//! create, check-in, check-out, cancel. All preconditions are validated
//! here; the repositories contribute only their compare-and-set transition
//! primitives, so a losing concurrent caller observes a clean
//! `InvalidState` or `SpotUnavailable` instead of corrupting the row.
//!
//! Transition map (spot status in parentheses):
//!
//! ```text
//! create    —  Reserved   (spot Available→Reserved)
//! check-in  —  Reserved→Active     (spot Reserved→Occupied)
//! check-out —  Active→Completed    (spot Occupied→Available), after payment
//! cancel    —  Reserved→Cancelled  (spot →Available), fee per grace rules
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::application::fees;
use crate::application::services::PaymentService;
use crate::config::ReservationsConfig;
use crate::domain::car::Car;
use crate::domain::payment::PaymentMethod;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::{Reservation, SessionStatus};
use crate::domain::zone::{ParkingSpot, ParkingZone};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::crypto::QrTokenCodec;
use crate::notifications::events::{ReservationCancelledEvent, ReservationCreatedEvent};
use crate::notifications::{Event, SharedEventBus};
use crate::shared::validations::is_valid_plate;

/// Orchestrates the reservation state machine
pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    codec: QrTokenCodec,
    payments: Arc<PaymentService>,
    event_bus: SharedEventBus,
    rules: ReservationsConfig,
}

impl ReservationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        codec: QrTokenCodec,
        payments: Arc<PaymentService>,
        event_bus: SharedEventBus,
        rules: ReservationsConfig,
    ) -> Self {
        Self {
            repos,
            codec,
            payments,
            event_bus,
            rules,
        }
    }

    // ── Create ──────────────────────────────────────────────────

    /// Reserve a spot for one of the user's cars.
    ///
    /// The hold row is persisted first (an insert is uncontended), then the
    /// spot is claimed with a compare-and-set. Losing the spot race cancels
    /// the just-created hold and surfaces `SpotUnavailable`, so no
    /// half-created reservation survives.
    pub async fn create_reservation(
        &self,
        user_id: i32,
        car_id: i32,
        spot_id: i32,
        zone_id: i32,
    ) -> DomainResult<Reservation> {
        let user = self
            .repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: user_id.to_string(),
            })?;

        let car = self
            .repos
            .cars()
            .find_by_id(car_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Car",
                field: "id",
                value: car_id.to_string(),
            })?;
        if !car.is_owned_by(user_id) {
            return Err(DomainError::CarNotOwned { car_id, user_id });
        }

        if self.repos.reservations().has_open_for_car(car_id).await? {
            return Err(DomainError::ActiveReservationExists { car_id });
        }

        let zone = self.zone(zone_id).await?;
        if zone.is_full {
            return Err(DomainError::ZoneFull { zone_id });
        }

        let spot = self.spot(spot_id).await?;
        if spot.zone_id != zone_id {
            return Err(DomainError::Validation(format!(
                "Spot {} is not in zone {}",
                spot_id, zone_id
            )));
        }

        let mut reservation = self
            .repos
            .reservations()
            .save(Reservation::new(user_id, car_id, spot_id))
            .await?;

        if !self.repos.spots().reserve(spot_id, reservation.id).await? {
            // Lost the spot to a concurrent create; void the hold.
            self.repos
                .reservations()
                .cancel_hold(reservation.id, Decimal::ZERO)
                .await?;
            return Err(DomainError::SpotUnavailable { spot_id });
        }

        let token = self
            .codec
            .generate(reservation.id, user_id, reservation.created_at);
        self.repos
            .reservations()
            .set_token(reservation.id, &token)
            .await?;
        reservation.qr_token = token.clone();

        self.refresh_zone_full(zone_id).await;

        counter!("reservations_created_total").increment(1);
        info!(
            "🅿️  Reservation {} created: user={}, car={}, spot={}",
            reservation.id, user_id, car_id, spot_id
        );

        self.event_bus
            .publish(Event::ReservationCreated(ReservationCreatedEvent {
                reservation_id: reservation.id,
                user_id,
                email: user.email,
                created_at: reservation.created_at,
                qr_token: token,
            }));

        Ok(reservation)
    }

    // ── Check-in ────────────────────────────────────────────────

    /// Start a parking session at the entry gate.
    ///
    /// Authenticates by QR token plus scanned plate. The Reserved→Active
    /// transition is a compare-and-set; of two concurrent scans exactly one
    /// wins and the other sees `InvalidState`.
    pub async fn start_parking(
        &self,
        qr_token: &str,
        scanned_plate: &str,
    ) -> DomainResult<Reservation> {
        let claims = self.codec.decode(qr_token)?;
        if Utc::now() - claims.issued_at > Duration::hours(self.rules.token_ttl_hours) {
            return Err(DomainError::ExpiredToken);
        }

        let reservation = self
            .load_for_token(claims.reservation_id, claims.user_id)
            .await?;
        if reservation.status != SessionStatus::Reserved || reservation.entry_time.is_some() {
            return Err(DomainError::InvalidState(format!(
                "cannot check in a {} reservation",
                reservation.status
            )));
        }

        let car = self.car_of(&reservation).await?;
        self.check_plate(&car, scanned_plate)?;

        if !self
            .repos
            .reservations()
            .begin_session(reservation.id, Utc::now())
            .await?
        {
            return Err(DomainError::InvalidState(
                "reservation was checked in concurrently".to_string(),
            ));
        }

        if !self.repos.spots().occupy(reservation.spot_id).await? {
            // Spot left Reserved outside the normal flow (e.g. marked for
            // maintenance after the hold was taken).
            let status = self
                .repos
                .spots()
                .find_by_id(reservation.spot_id)
                .await?
                .map(|s| s.status.to_string())
                .unwrap_or_else(|| "missing".to_string());
            warn!(
                "Spot {} could not be occupied for reservation {}: status={}",
                reservation.spot_id, reservation.id, status
            );
            return Err(DomainError::InvalidSpotTransition {
                spot_id: reservation.spot_id,
                status,
            });
        }

        counter!("parking_sessions_started_total").increment(1);
        info!(
            "🚗 Check-in: reservation={}, spot={}",
            reservation.id, reservation.spot_id
        );

        self.reload(reservation.id).await
    }

    // ── Check-out ───────────────────────────────────────────────

    /// End a parking session at the exit gate: compute the fee, settle the
    /// payment, complete the reservation and free the spot.
    ///
    /// Token age is deliberately not checked here — a car must always be
    /// able to leave. If the payment is rejected the reservation stays
    /// Active with its exit time recorded, and a retried call reuses that
    /// timestamp instead of billing a longer stay.
    pub async fn end_parking(
        &self,
        qr_token: &str,
        scanned_plate: &str,
        method: PaymentMethod,
    ) -> DomainResult<Reservation> {
        let claims = self.codec.decode(qr_token)?;
        let reservation = self
            .load_for_token(claims.reservation_id, claims.user_id)
            .await?;

        let car = self.car_of(&reservation).await?;
        self.check_plate(&car, scanned_plate)?;

        let entry_time = match (reservation.status, reservation.entry_time) {
            (SessionStatus::Active, Some(t)) => t,
            _ => {
                return Err(DomainError::InvalidState(format!(
                    "cannot check out a {} reservation",
                    reservation.status
                )));
            }
        };

        let exit_time = match reservation.exit_time {
            Some(t) => t,
            None => {
                let now = Utc::now();
                if self
                    .repos
                    .reservations()
                    .set_exit_time(reservation.id, now)
                    .await?
                {
                    now
                } else {
                    // A concurrent attempt recorded the exit first; reuse it.
                    self.reload(reservation.id)
                        .await?
                        .exit_time
                        .ok_or(DomainError::InvalidState(
                            "exit time vanished during check-out".to_string(),
                        ))?
                }
            }
        };

        let (spot, zone) = self.spot_and_zone(reservation.spot_id).await?;
        let fee = fees::parking_fee(entry_time, exit_time, zone.hourly_rate)?;
        self.repos
            .reservations()
            .set_total_amount(reservation.id, fee)
            .await?;

        // A rejection propagates as PaymentFailed and leaves the
        // reservation Active, so the whole call is retryable.
        self.payments.process(reservation.id, fee, method).await?;

        if !self.repos.reservations().complete(reservation.id).await? {
            return Err(DomainError::InvalidState(
                "reservation was completed concurrently".to_string(),
            ));
        }
        self.repos.spots().release(spot.id).await?;
        self.refresh_zone_full(zone.id).await;

        counter!("parking_sessions_completed_total").increment(1);
        info!(
            "🏁 Check-out: reservation={}, fee={}, method={}",
            reservation.id, fee, method
        );

        self.reload(reservation.id).await
    }

    // ── Cancel ──────────────────────────────────────────────────

    /// Cancel a not-yet-started reservation on the owner's request.
    ///
    /// Free inside the grace window or when never paid; otherwise the
    /// cancellation fee becomes the reservation's total amount.
    pub async fn cancel_reservation(
        &self,
        reservation_id: i32,
        user_id: i32,
    ) -> DomainResult<Reservation> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id_for_user(reservation_id, user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Reservation",
                field: "id",
                value: reservation_id.to_string(),
            })?;

        if reservation.status != SessionStatus::Reserved {
            return Err(DomainError::InvalidState(format!(
                "only a Reserved reservation can be cancelled, this one is {}",
                reservation.status
            )));
        }

        let (spot, zone) = self.spot_and_zone(reservation.spot_id).await?;
        let now = Utc::now();
        let fee = fees::cancellation_fee(
            reservation.created_at,
            now,
            zone.hourly_rate,
            reservation.is_paid,
            self.rules.grace_period_minutes,
        );

        if !self
            .repos
            .reservations()
            .cancel_hold(reservation.id, fee)
            .await?
        {
            // The expiry sweep or a concurrent call got here first.
            return Err(DomainError::InvalidState(
                "reservation already left the Reserved state".to_string(),
            ));
        }
        self.repos.spots().release(spot.id).await?;
        self.refresh_zone_full(zone.id).await;

        counter!("reservations_cancelled_total").increment(1);
        info!(
            "❌ Reservation {} cancelled by user {}, fee={}",
            reservation.id, user_id, fee
        );

        match self.repos.users().find_by_id(user_id).await? {
            Some(user) => {
                self.event_bus
                    .publish(Event::ReservationCancelled(ReservationCancelledEvent {
                        reservation_id: reservation.id,
                        parking_zone_name: zone.name,
                        email: user.email,
                        cancelled_at: now,
                    }));
            }
            None => warn!(
                "No user {} for cancellation notification of reservation {}",
                user_id, reservation.id
            ),
        }

        self.reload(reservation.id).await
    }

    // ── Queries ─────────────────────────────────────────────────

    /// All reservations of the user, newest first
    pub async fn get_user_reservations(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        self.repos.reservations().find_for_user(user_id).await
    }

    /// Current parking fee of an Active session, as if the car left now
    pub async fn get_parking_fee(
        &self,
        reservation_id: i32,
        user_id: i32,
    ) -> DomainResult<Decimal> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id_for_user(reservation_id, user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Reservation",
                field: "id",
                value: reservation_id.to_string(),
            })?;

        let entry_time = match (reservation.status, reservation.entry_time) {
            (SessionStatus::Active, Some(t)) => t,
            _ => {
                return Err(DomainError::InvalidState(
                    "parking fee applies to an active session only".to_string(),
                ));
            }
        };

        let (_, zone) = self.spot_and_zone(reservation.spot_id).await?;
        fees::parking_fee(entry_time, Utc::now(), zone.hourly_rate)
    }

    /// What cancelling a Reserved hold would cost right now
    pub async fn get_cancellation_fee(
        &self,
        reservation_id: i32,
        user_id: i32,
    ) -> DomainResult<Decimal> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id_for_user(reservation_id, user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Reservation",
                field: "id",
                value: reservation_id.to_string(),
            })?;

        if reservation.status != SessionStatus::Reserved {
            return Err(DomainError::InvalidState(
                "cancellation fee applies to a Reserved hold only".to_string(),
            ));
        }

        let (_, zone) = self.spot_and_zone(reservation.spot_id).await?;
        Ok(fees::cancellation_fee(
            reservation.created_at,
            Utc::now(),
            zone.hourly_rate,
            reservation.is_paid,
            self.rules.grace_period_minutes,
        ))
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn load_for_token(
        &self,
        reservation_id: i32,
        user_id: i32,
    ) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id_for_user(reservation_id, user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Reservation",
                field: "id",
                value: reservation_id.to_string(),
            })
    }

    async fn reload(&self, reservation_id: i32) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Reservation",
                field: "id",
                value: reservation_id.to_string(),
            })
    }

    async fn car_of(&self, reservation: &Reservation) -> DomainResult<Car> {
        self.repos
            .cars()
            .find_by_id(reservation.car_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Car",
                field: "id",
                value: reservation.car_id.to_string(),
            })
    }

    fn check_plate(&self, car: &Car, scanned_plate: &str) -> DomainResult<()> {
        let plate = scanned_plate.trim().to_uppercase();
        if !is_valid_plate(&plate) {
            return Err(DomainError::InvalidPlateFormat(scanned_plate.to_string()));
        }
        if !car.plate_matches(&plate) {
            return Err(DomainError::PlateMismatch);
        }
        Ok(())
    }

    async fn zone(&self, zone_id: i32) -> DomainResult<ParkingZone> {
        self.repos
            .zones()
            .find_by_id(zone_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "ParkingZone",
                field: "id",
                value: zone_id.to_string(),
            })
    }

    async fn spot(&self, spot_id: i32) -> DomainResult<ParkingSpot> {
        self.repos
            .spots()
            .find_by_id(spot_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "ParkingSpot",
                field: "id",
                value: spot_id.to_string(),
            })
    }

    async fn spot_and_zone(&self, spot_id: i32) -> DomainResult<(ParkingSpot, ParkingZone)> {
        let spot = self.spot(spot_id).await?;
        let zone = self.zone(spot.zone_id).await?;
        Ok((spot, zone))
    }

    /// Recompute the zone's cached full flag after a spot mutation.
    /// Best-effort: a stale flag only delays a ZoneFull rejection.
    async fn refresh_zone_full(&self, zone_id: i32) {
        let full = match self.repos.spots().count_available(zone_id).await {
            Ok(n) => n == 0,
            Err(e) => {
                warn!("Could not count available spots in zone {}: {}", zone_id, e);
                return;
            }
        };
        if let Err(e) = self.repos.zones().set_full_flag(zone_id, full).await {
            warn!("Could not refresh full flag of zone {}: {}", zone_id, e);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::application::ports::AutoApproveGateway;
    use crate::domain::user::User;
    use crate::domain::zone::SpotStatus;
    use crate::infrastructure::memory::InMemoryRepositoryProvider;
    use crate::notifications::create_event_bus;

    const TEST_SECRET: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    struct Fixture {
        repos: Arc<InMemoryRepositoryProvider>,
        service: ReservationService,
        bus: SharedEventBus,
        user_id: i32,
        car_id: i32,
        zone_id: i32,
        spot_id: i32,
    }

    async fn fixture() -> Fixture {
        fixture_with_rate("5.00").await
    }

    async fn fixture_with_rate(rate: &str) -> Fixture {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let bus = create_event_bus();

        let user = repos
            .users()
            .save(User::new(0, "driver@example.com", "Driver"))
            .await
            .unwrap();
        let car = repos
            .cars()
            .save(Car::new(0, user.id, "ABC1234", "Model 3", "white"))
            .await
            .unwrap();
        let zone = repos
            .zones()
            .save(ParkingZone::new(
                0,
                "Center",
                1,
                2,
                Decimal::from_str(rate).unwrap(),
            ))
            .await
            .unwrap();
        repos
            .spots()
            .insert_many(vec![
                ParkingSpot::new(0, zone.id, 1, 1),
                ParkingSpot::new(0, zone.id, 1, 2),
            ])
            .await
            .unwrap();

        let codec = QrTokenCodec::new(TEST_SECRET).unwrap();
        let payments = Arc::new(PaymentService::new(
            repos.clone(),
            Arc::new(AutoApproveGateway),
        ));
        let service = ReservationService::new(
            repos.clone(),
            codec,
            payments,
            bus.clone(),
            ReservationsConfig::default(),
        );

        Fixture {
            repos,
            service,
            bus,
            user_id: user.id,
            car_id: car.id,
            zone_id: zone.id,
            spot_id: 1,
        }
    }

    #[tokio::test]
    async fn full_lifecycle_reserved_active_completed() {
        let f = fixture().await;

        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();
        assert_eq!(r.status, SessionStatus::Reserved);
        assert!(!r.qr_token.is_empty());

        let started = f.service.start_parking(&r.qr_token, "abc1234").await.unwrap();
        assert_eq!(started.status, SessionStatus::Active);
        assert!(started.entry_time.is_some());

        let spot = f.repos.spots().find_by_id(f.spot_id).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Occupied);

        let done = f
            .service
            .end_parking(&r.qr_token, "ABC1234", PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert!(done.is_paid);
        // Started hour bills in full even for a seconds-long stay
        assert_eq!(done.total_amount, Some(Decimal::from_str("5.00").unwrap()));

        let spot = f.repos.spots().find_by_id(f.spot_id).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Available);
        assert_eq!(spot.reservation_id, None);
    }

    #[tokio::test]
    async fn create_rejects_foreign_car() {
        let f = fixture().await;
        let stranger = f
            .repos
            .users()
            .save(User::new(0, "other@example.com", "Other"))
            .await
            .unwrap();

        let err = f
            .service
            .create_reservation(stranger.id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CarNotOwned { .. }));
    }

    #[tokio::test]
    async fn one_open_reservation_per_car() {
        let f = fixture().await;
        f.service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        let err = f
            .service
            .create_reservation(f.user_id, f.car_id, 2, f.zone_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ActiveReservationExists { .. }));
    }

    #[tokio::test]
    async fn taken_spot_is_unavailable_and_hold_is_voided() {
        let f = fixture().await;
        f.service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        let other_user = f
            .repos
            .users()
            .save(User::new(0, "second@example.com", "Second"))
            .await
            .unwrap();
        let other_car = f
            .repos
            .cars()
            .save(Car::new(0, other_user.id, "XYZ9876", "Leaf", "blue"))
            .await
            .unwrap();

        let err = f
            .service
            .create_reservation(other_user.id, other_car.id, f.spot_id, f.zone_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SpotUnavailable { .. }));

        // The loser's compensated hold must not block the car from retrying
        let open = f
            .repos
            .reservations()
            .has_open_for_car(other_car.id)
            .await
            .unwrap();
        assert!(!open);
    }

    #[tokio::test]
    async fn full_zone_rejects_creation() {
        let f = fixture().await;
        // Occupy both spots of the 1x2 zone directly through the ledger
        f.repos.spots().reserve(1, 991).await.unwrap();
        f.repos.spots().reserve(2, 992).await.unwrap();
        f.repos.zones().set_full_flag(f.zone_id, true).await.unwrap();

        let err = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ZoneFull { .. }));
    }

    #[tokio::test]
    async fn plate_mismatch_leaves_everything_reserved() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        let err = f.service.start_parking(&r.qr_token, "XYZ9876").await.unwrap_err();
        assert!(matches!(err, DomainError::PlateMismatch));

        let reloaded = f
            .repos
            .reservations()
            .find_by_id(r.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, SessionStatus::Reserved);
        assert!(reloaded.entry_time.is_none());

        let spot = f.repos.spots().find_by_id(f.spot_id).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Reserved);
    }

    #[tokio::test]
    async fn malformed_plate_is_rejected_before_comparison() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        for plate in ["AB1234", "ABC12345", "1BC1234", ""] {
            let err = f.service.start_parking(&r.qr_token, plate).await.unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidPlateFormat(_)),
                "{plate:?} should be a format error"
            );
        }
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let f = fixture().await;
        let err = f
            .service
            .start_parking("not-a-token", "ABC1234")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidToken));
    }

    #[tokio::test]
    async fn stale_token_is_expired_at_the_entry_gate() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        // Forge a token with the real key but a 25h-old issue time
        let codec = QrTokenCodec::new(TEST_SECRET).unwrap();
        let stale = codec.generate(r.id, f.user_id, Utc::now() - Duration::hours(25));

        let err = f.service.start_parking(&stale, "ABC1234").await.unwrap_err();
        assert!(matches!(err, DomainError::ExpiredToken));
    }

    #[tokio::test]
    async fn double_check_in_fails_with_invalid_state() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        f.service.start_parking(&r.qr_token, "ABC1234").await.unwrap();
        let err = f.service.start_parking(&r.qr_token, "ABC1234").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn check_out_twice_does_not_double_charge() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();
        f.service.start_parking(&r.qr_token, "ABC1234").await.unwrap();
        f.service
            .end_parking(&r.qr_token, "ABC1234", PaymentMethod::Card)
            .await
            .unwrap();

        let err = f
            .service
            .end_parking(&r.qr_token, "ABC1234", PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        // Still exactly one payment
        let payment = f
            .repos
            .payments()
            .find_by_reservation(r.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.amount, Decimal::from_str("5.00").unwrap());
    }

    #[tokio::test]
    async fn rejected_payment_keeps_session_active_for_retry() {
        use crate::application::ports::PaymentGateway;
        use crate::shared::errors::PaymentError;
        use async_trait::async_trait;

        struct RejectingGateway;

        #[async_trait]
        impl PaymentGateway for RejectingGateway {
            async fn charge(
                &self,
                _reservation_id: i32,
                _amount: Decimal,
                _method: PaymentMethod,
            ) -> Result<(), PaymentError> {
                Err(PaymentError::Rejected("card declined".to_string()))
            }
        }

        let f = fixture().await;
        let rejecting = ReservationService::new(
            f.repos.clone(),
            QrTokenCodec::new(TEST_SECRET).unwrap(),
            Arc::new(PaymentService::new(
                f.repos.clone(),
                Arc::new(RejectingGateway),
            )),
            f.bus.clone(),
            ReservationsConfig::default(),
        );

        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();
        f.service.start_parking(&r.qr_token, "ABC1234").await.unwrap();

        let err = rejecting
            .end_parking(&r.qr_token, "ABC1234", PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PaymentFailed(_)));

        let mid = f
            .repos
            .reservations()
            .find_by_id(r.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mid.status, SessionStatus::Active);
        let first_exit = mid.exit_time.expect("exit time stays recorded");

        // Retry with a working gateway reuses the original exit timestamp
        let done = f
            .service
            .end_parking(&r.qr_token, "ABC1234", PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(done.exit_time, Some(first_exit));
    }

    #[tokio::test]
    async fn cancel_frees_the_spot_and_emits_event() {
        let f = fixture().await;
        let mut subscriber = f.bus.subscribe();

        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();
        let cancelled = f
            .service
            .cancel_reservation(r.id, f.user_id)
            .await
            .unwrap();

        assert_eq!(cancelled.status, SessionStatus::Cancelled);
        // Never paid, so cancellation is free
        assert_eq!(cancelled.total_amount, Some(Decimal::ZERO));

        let spot = f.repos.spots().find_by_id(f.spot_id).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Available);

        // created + cancelled events, in order
        let first = subscriber.recv().await.unwrap();
        assert_eq!(first.event.event_type(), "reservation_created");
        let second = subscriber.recv().await.unwrap();
        assert_eq!(second.event.event_type(), "reservation_cancelled");
    }

    #[tokio::test]
    async fn cancel_after_check_in_is_invalid() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();
        f.service.start_parking(&r.qr_token, "ABC1234").await.unwrap();

        let err = f.service.cancel_reservation(r.id, f.user_id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn cancel_is_scoped_to_the_owner() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        let err = f.service.cancel_reservation(r.id, 999).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn fee_previews_respect_state() {
        let f = fixture().await;
        let r = f
            .service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        // Reserved: cancellation preview works, parking preview does not
        let cancel_fee = f
            .service
            .get_cancellation_fee(r.id, f.user_id)
            .await
            .unwrap();
        assert_eq!(cancel_fee, Decimal::ZERO);
        assert!(f.service.get_parking_fee(r.id, f.user_id).await.is_err());

        f.service.start_parking(&r.qr_token, "ABC1234").await.unwrap();

        // Active: the mirror image
        let parking_fee = f.service.get_parking_fee(r.id, f.user_id).await.unwrap();
        assert_eq!(parking_fee, Decimal::from_str("5.00").unwrap());
        assert!(f.service.get_cancellation_fee(r.id, f.user_id).await.is_err());
    }

    #[tokio::test]
    async fn reserving_the_last_spot_marks_the_zone_full() {
        let f = fixture().await;
        f.repos.spots().reserve(2, 990).await.unwrap();

        f.service
            .create_reservation(f.user_id, f.car_id, f.spot_id, f.zone_id)
            .await
            .unwrap();

        let zone = f.repos.zones().find_by_id(f.zone_id).await.unwrap().unwrap();
        assert!(zone.is_full);
    }
}
