//! In-memory repository implementation
//!
//! DashMap-backed stores for development and unit tests, implementing the
//! same repository traits as the SeaORM layer. Conditional transitions run
//! under the per-key entry guard, which gives them the same winner-takes-it
//! semantics as the SQL WHERE-clause updates.

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::domain::car::{Car, CarRepository};
use crate::domain::payment::{Payment, PaymentRepository};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::{Reservation, ReservationRepository, SessionStatus};
use crate::domain::user::{User, UserRepository};
use crate::domain::zone::{ParkingSpot, ParkingZone, SpotLedger, SpotStatus, ZoneRepository};
use crate::domain::{DomainError, DomainResult};

/// In-memory repository provider for development and testing
pub struct InMemoryRepositoryProvider {
    users: DashMap<i32, User>,
    cars: DashMap<i32, Car>,
    zones: DashMap<i32, ParkingZone>,
    spots: DashMap<i32, ParkingSpot>,
    reservations: DashMap<i32, Reservation>,
    payments: DashMap<i32, Payment>,
    user_counter: AtomicI32,
    car_counter: AtomicI32,
    zone_counter: AtomicI32,
    spot_counter: AtomicI32,
    reservation_counter: AtomicI32,
    payment_counter: AtomicI32,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            cars: DashMap::new(),
            zones: DashMap::new(),
            spots: DashMap::new(),
            reservations: DashMap::new(),
            payments: DashMap::new(),
            user_counter: AtomicI32::new(1),
            car_counter: AtomicI32::new(1),
            zone_counter: AtomicI32::new(1),
            spot_counter: AtomicI32::new(1),
            reservation_counter: AtomicI32::new(1),
            payment_counter: AtomicI32::new(1),
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn cars(&self) -> &dyn CarRepository {
        self
    }

    fn zones(&self) -> &dyn ZoneRepository {
        self
    }

    fn spots(&self) -> &dyn SpotLedger {
        self
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }

    fn payments(&self) -> &dyn PaymentRepository {
        self
    }
}

// ── Users ───────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut user: User) -> DomainResult<User> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::Validation(
                "Email already registered".to_string(),
            ));
        }
        user.id = self.user_counter.fetch_add(1, Ordering::SeqCst);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }
}

// ── Cars ────────────────────────────────────────────────────────

#[async_trait]
impl CarRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut car: Car) -> DomainResult<Car> {
        if self.cars.iter().any(|c| c.plate_number == car.plate_number) {
            return Err(DomainError::Validation(
                "Plate number already registered".to_string(),
            ));
        }
        car.id = self.car_counter.fetch_add(1, Ordering::SeqCst);
        self.cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Car>> {
        Ok(self.cars.get(&id).map(|c| c.clone()))
    }

    async fn find_by_plate(&self, plate_number: &str) -> DomainResult<Option<Car>> {
        let plate = plate_number.to_uppercase();
        Ok(self
            .cars
            .iter()
            .find(|c| c.plate_number == plate)
            .map(|c| c.clone()))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Car>> {
        let mut cars: Vec<Car> = self
            .cars
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.clone())
            .collect();
        cars.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(cars)
    }
}

// ── Zones ───────────────────────────────────────────────────────

#[async_trait]
impl ZoneRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut zone: ParkingZone) -> DomainResult<ParkingZone> {
        zone.id = self.zone_counter.fetch_add(1, Ordering::SeqCst);
        self.zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingZone>> {
        Ok(self.zones.get(&id).map(|z| z.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingZone>> {
        let mut zones: Vec<ParkingZone> = self.zones.iter().map(|z| z.clone()).collect();
        zones.sort_by_key(|z| z.id);
        Ok(zones)
    }

    async fn set_full_flag(&self, zone_id: i32, is_full: bool) -> DomainResult<()> {
        if let Some(mut zone) = self.zones.get_mut(&zone_id) {
            zone.is_full = is_full;
        }
        Ok(())
    }
}

// ── Spot ledger ─────────────────────────────────────────────────

#[async_trait]
impl SpotLedger for InMemoryRepositoryProvider {
    async fn insert_many(&self, spots: Vec<ParkingSpot>) -> DomainResult<()> {
        for mut spot in spots {
            spot.id = self.spot_counter.fetch_add(1, Ordering::SeqCst);
            self.spots.insert(spot.id, spot);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSpot>> {
        Ok(self.spots.get(&id).map(|s| s.clone()))
    }

    async fn find_by_zone(
        &self,
        zone_id: i32,
        status: Option<SpotStatus>,
    ) -> DomainResult<Vec<ParkingSpot>> {
        let mut spots: Vec<ParkingSpot> = self
            .spots
            .iter()
            .filter(|s| s.zone_id == zone_id && status.map_or(true, |st| s.status == st))
            .map(|s| s.clone())
            .collect();
        spots.sort_by_key(|s| (s.floor, s.id));
        Ok(spots)
    }

    async fn count_available(&self, zone_id: i32) -> DomainResult<u64> {
        Ok(self
            .spots
            .iter()
            .filter(|s| s.zone_id == zone_id && s.status == SpotStatus::Available)
            .count() as u64)
    }

    async fn reserve(&self, spot_id: i32, reservation_id: i32) -> DomainResult<bool> {
        match self.spots.get_mut(&spot_id) {
            Some(mut spot) if spot.status == SpotStatus::Available => {
                spot.status = SpotStatus::Reserved;
                spot.reservation_id = Some(reservation_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn occupy(&self, spot_id: i32) -> DomainResult<bool> {
        match self.spots.get_mut(&spot_id) {
            Some(mut spot) if spot.status == SpotStatus::Reserved => {
                spot.status = SpotStatus::Occupied;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, spot_id: i32) -> DomainResult<()> {
        if let Some(mut spot) = self.spots.get_mut(&spot_id) {
            spot.status = SpotStatus::Available;
            spot.reservation_id = None;
        }
        Ok(())
    }
}

// ── Reservations ────────────────────────────────────────────────

#[async_trait]
impl ReservationRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut reservation: Reservation) -> DomainResult<Reservation> {
        reservation.id = self.reservation_counter.fetch_add(1, Ordering::SeqCst);
        self.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn set_token(&self, id: i32, qr_token: &str) -> DomainResult<()> {
        if let Some(mut r) = self.reservations.get_mut(&id) {
            r.qr_token = qr_token.to_string();
        }
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(&id).map(|r| r.clone()))
    }

    async fn find_by_id_for_user(
        &self,
        id: i32,
        user_id: i32,
    ) -> DomainResult<Option<Reservation>> {
        Ok(self
            .reservations
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone()))
    }

    async fn find_for_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn has_open_for_car(&self, car_id: i32) -> DomainResult<bool> {
        Ok(self
            .reservations
            .iter()
            .any(|r| r.car_id == car_id && r.is_open()))
    }

    async fn begin_session(&self, id: i32, entry_time: DateTime<Utc>) -> DomainResult<bool> {
        match self.reservations.get_mut(&id) {
            Some(mut r)
                if r.status == SessionStatus::Reserved && r.entry_time.is_none() =>
            {
                r.status = SessionStatus::Active;
                r.entry_time = Some(entry_time);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_exit_time(&self, id: i32, exit_time: DateTime<Utc>) -> DomainResult<bool> {
        match self.reservations.get_mut(&id) {
            Some(mut r) if r.exit_time.is_none() => {
                r.exit_time = Some(exit_time);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_total_amount(&self, id: i32, amount: Decimal) -> DomainResult<()> {
        if let Some(mut r) = self.reservations.get_mut(&id) {
            r.total_amount = Some(amount);
        }
        Ok(())
    }

    async fn complete(&self, id: i32) -> DomainResult<bool> {
        match self.reservations.get_mut(&id) {
            Some(mut r) if r.status == SessionStatus::Active => {
                r.status = SessionStatus::Completed;
                r.is_paid = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_hold(&self, id: i32, fee: Decimal) -> DomainResult<bool> {
        match self.reservations.get_mut(&id) {
            Some(mut r) if r.status == SessionStatus::Reserved => {
                r.status = SessionStatus::Cancelled;
                r.total_amount = Some(fee);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_hold(&self, id: i32) -> DomainResult<bool> {
        match self.reservations.get_mut(&id) {
            Some(mut r) if r.status == SessionStatus::Reserved => {
                r.status = SessionStatus::Cancelled;
                r.is_paid = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_reserved_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.status == SessionStatus::Reserved && r.created_at <= cutoff)
            .map(|r| r.clone())
            .collect())
    }

    async fn find_reserved_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| {
                r.status == SessionStatus::Reserved && r.created_at > from && r.created_at <= to
            })
            .map(|r| r.clone())
            .collect())
    }
}

// ── Payments ────────────────────────────────────────────────────

#[async_trait]
impl PaymentRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut payment: Payment) -> DomainResult<Payment> {
        if self
            .payments
            .iter()
            .any(|p| p.reservation_id == payment.reservation_id)
        {
            return Err(DomainError::Validation(
                "Payment already recorded for reservation".to_string(),
            ));
        }
        payment.id = self.payment_counter.fetch_add(1, Ordering::SeqCst);
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update(&self, payment: Payment) -> DomainResult<()> {
        if !self.payments.contains_key(&payment.id) {
            return Err(DomainError::NotFound {
                entity: "Payment",
                field: "id",
                value: payment.id.to_string(),
            });
        }
        self.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Payment>> {
        Ok(self.payments.get(&id).map(|p| p.clone()))
    }

    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Option<Payment>> {
        Ok(self
            .payments
            .iter()
            .find(|p| p.reservation_id == reservation_id)
            .map(|p| p.clone()))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Payment>> {
        let reservation_ids: Vec<i32> = self
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.id)
            .collect();

        let mut out: Vec<Payment> = self
            .payments
            .iter()
            .filter(|p| reservation_ids.contains(&p.reservation_id))
            .map(|p| p.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spot(zone_id: i32) -> ParkingSpot {
        ParkingSpot {
            id: 0,
            zone_id,
            spot_number: "F1S1".to_string(),
            floor: 1,
            status: SpotStatus::Available,
            reservation_id: None,
        }
    }

    #[tokio::test]
    async fn reserve_is_won_exactly_once() {
        let repos = InMemoryRepositoryProvider::new();
        repos.insert_many(vec![sample_spot(1)]).await.unwrap();

        assert!(repos.reserve(1, 10).await.unwrap());
        assert!(!repos.reserve(1, 11).await.unwrap());

        let spot = SpotLedger::find_by_id(&repos, 1).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Reserved);
        assert_eq!(spot.reservation_id, Some(10));
    }

    #[tokio::test]
    async fn occupy_requires_reserved() {
        let repos = InMemoryRepositoryProvider::new();
        repos.insert_many(vec![sample_spot(1)]).await.unwrap();

        assert!(!repos.occupy(1).await.unwrap());
        repos.reserve(1, 10).await.unwrap();
        assert!(repos.occupy(1).await.unwrap());
        assert!(!repos.occupy(1).await.unwrap());
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let repos = InMemoryRepositoryProvider::new();
        repos.insert_many(vec![sample_spot(1)]).await.unwrap();
        repos.reserve(1, 10).await.unwrap();

        repos.release(1).await.unwrap();
        repos.release(1).await.unwrap();

        let spot = SpotLedger::find_by_id(&repos, 1).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Available);
        assert_eq!(spot.reservation_id, None);
    }

    #[tokio::test]
    async fn begin_session_moves_reserved_to_active_once() {
        let repos = InMemoryRepositoryProvider::new();
        let r = ReservationRepository::save(&repos, Reservation::new(1, 2, 3))
            .await
            .unwrap();

        assert!(repos.begin_session(r.id, Utc::now()).await.unwrap());
        assert!(!repos.begin_session(r.id, Utc::now()).await.unwrap());

        let loaded = ReservationRepository::find_by_id(&repos, r.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, SessionStatus::Active);
        assert!(loaded.entry_time.is_some());
    }

    #[tokio::test]
    async fn exit_time_is_recorded_once() {
        let repos = InMemoryRepositoryProvider::new();
        let r = ReservationRepository::save(&repos, Reservation::new(1, 2, 3))
            .await
            .unwrap();
        repos.begin_session(r.id, Utc::now()).await.unwrap();

        let first = Utc::now();
        assert!(repos.set_exit_time(r.id, first).await.unwrap());
        assert!(!repos.set_exit_time(r.id, Utc::now()).await.unwrap());

        let loaded = ReservationRepository::find_by_id(&repos, r.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.exit_time, Some(first));
    }

    #[tokio::test]
    async fn cancel_hold_loses_once_session_started() {
        let repos = InMemoryRepositoryProvider::new();
        let r = ReservationRepository::save(&repos, Reservation::new(1, 2, 3))
            .await
            .unwrap();
        repos.begin_session(r.id, Utc::now()).await.unwrap();

        assert!(!repos.cancel_hold(r.id, Decimal::ZERO).await.unwrap());
        assert!(!repos.expire_hold(r.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_plate_is_rejected() {
        let repos = InMemoryRepositoryProvider::new();
        let car = Car::new(0, 1, "ABC1234", "Civic", "red");
        CarRepository::save(&repos, car.clone()).await.unwrap();

        let err = CarRepository::save(&repos, car).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
