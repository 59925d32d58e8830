//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::car::CarRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::user::UserRepository;
use crate::domain::zone::{SpotLedger, ZoneRepository};

use super::car_repository::SeaOrmCarRepository;
use super::payment_repository::SeaOrmPaymentRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::spot_repository::SeaOrmSpotLedger;
use super::user_repository::SeaOrmUserRepository;
use super::zone_repository::SeaOrmZoneRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let car = repos.cars().find_by_plate("ABC1234").await?;
/// let open = repos.reservations().has_open_for_car(car.id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    users: SeaOrmUserRepository,
    cars: SeaOrmCarRepository,
    zones: SeaOrmZoneRepository,
    spots: SeaOrmSpotLedger,
    reservations: SeaOrmReservationRepository,
    payments: SeaOrmPaymentRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            cars: SeaOrmCarRepository::new(db.clone()),
            zones: SeaOrmZoneRepository::new(db.clone()),
            spots: SeaOrmSpotLedger::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            payments: SeaOrmPaymentRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn cars(&self) -> &dyn CarRepository {
        &self.cars
    }

    fn zones(&self) -> &dyn ZoneRepository {
        &self.zones
    }

    fn spots(&self) -> &dyn SpotLedger {
        &self.spots
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }
}
