//! Zone repository and spot ledger interfaces

use async_trait::async_trait;

use super::model::{ParkingSpot, ParkingZone, SpotStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait ZoneRepository: Send + Sync {
    async fn save(&self, zone: ParkingZone) -> DomainResult<ParkingZone>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingZone>>;
    async fn find_all(&self) -> DomainResult<Vec<ParkingZone>>;
    /// Refresh the cached `is_full` flag
    async fn set_full_flag(&self, zone_id: i32, is_full: bool) -> DomainResult<()>;
}

/// Occupancy bookkeeping for parking spots.
///
/// The ledger is the only mutation path for spot status. `reserve` and
/// `occupy` are compare-and-set operations: they return `false` when the
/// spot was not in the expected status at commit time, so two concurrent
/// callers can never both win the same spot.
#[async_trait]
pub trait SpotLedger: Send + Sync {
    async fn insert_many(&self, spots: Vec<ParkingSpot>) -> DomainResult<()>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSpot>>;
    async fn find_by_zone(
        &self,
        zone_id: i32,
        status: Option<SpotStatus>,
    ) -> DomainResult<Vec<ParkingSpot>>;
    async fn count_available(&self, zone_id: i32) -> DomainResult<u64>;

    /// Available → Reserved, recording the holding reservation.
    /// Returns `false` if the spot was not Available.
    async fn reserve(&self, spot_id: i32, reservation_id: i32) -> DomainResult<bool>;

    /// Reserved → Occupied. Returns `false` if the spot was not Reserved.
    async fn occupy(&self, spot_id: i32) -> DomainResult<bool>;

    /// Any status → Available, clearing the reservation reference.
    /// Releasing an already-available spot is a no-op, not an error.
    async fn release(&self, spot_id: i32) -> DomainResult<()>;
}
