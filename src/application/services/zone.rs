//! Parking zone management
//!
//! Creating a zone also lays out its spot grid (`F{floor}S{n}` labels, all
//! Available). Occupancy queries recompute the zone's cached full flag as a
//! side effect, so the flag self-heals after any drift.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::domain::repositories::RepositoryProvider;
use crate::domain::zone::{ParkingSpot, ParkingZone, SpotStatus};
use crate::domain::{DomainError, DomainResult};

/// Occupancy distribution of one zone
#[derive(Debug, Clone)]
pub struct ZoneStatus {
    pub zone_id: i32,
    pub name: String,
    pub total_spots: u64,
    pub available: u64,
    pub reserved: u64,
    pub occupied: u64,
    pub maintenance: u64,
    pub out_of_service: u64,
    pub is_full: bool,
    pub available_per_floor: Vec<FloorAvailability>,
}

/// Available spot count on one floor
#[derive(Debug, Clone)]
pub struct FloorAvailability {
    pub floor: i32,
    pub available: u64,
}

/// Service for zone and spot-grid administration
pub struct ZoneService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ZoneService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Create a zone and generate its spot grid
    pub async fn create_zone(
        &self,
        name: &str,
        total_floors: i32,
        spots_per_floor: i32,
        hourly_rate: Decimal,
        description: Option<String>,
    ) -> DomainResult<ParkingZone> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("Zone name is required".to_string()));
        }
        if total_floors < 1 || spots_per_floor < 1 {
            return Err(DomainError::Validation(
                "A zone needs at least one floor with one spot".to_string(),
            ));
        }
        if hourly_rate <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "Hourly rate must be positive".to_string(),
            ));
        }

        let mut zone = ParkingZone::new(0, name.trim(), total_floors, spots_per_floor, hourly_rate);
        zone.description = description;
        let zone = self.repos.zones().save(zone).await?;

        let mut spots = Vec::with_capacity(zone.capacity() as usize);
        for floor in 1..=total_floors {
            for n in 1..=spots_per_floor {
                spots.push(ParkingSpot::new(0, zone.id, floor, n));
            }
        }
        self.repos.spots().insert_many(spots).await?;

        info!(
            "🏢 Zone '{}' created: {} floors × {} spots, rate {}/h",
            zone.name, total_floors, spots_per_floor, hourly_rate
        );
        Ok(zone)
    }

    pub async fn list_zones(&self) -> DomainResult<Vec<ParkingZone>> {
        self.repos.zones().find_all().await
    }

    /// Spots of a zone, optionally filtered by status
    pub async fn list_spots(
        &self,
        zone_id: i32,
        status: Option<SpotStatus>,
    ) -> DomainResult<Vec<ParkingSpot>> {
        self.require_zone(zone_id).await?;
        self.repos.spots().find_by_zone(zone_id, status).await
    }

    /// Occupancy distribution; refreshes the cached full flag while counting
    pub async fn zone_status(&self, zone_id: i32) -> DomainResult<ZoneStatus> {
        let zone = self.require_zone(zone_id).await?;
        let spots = self.repos.spots().find_by_zone(zone_id, None).await?;

        let count = |status: SpotStatus| spots.iter().filter(|s| s.status == status).count() as u64;
        let available = count(SpotStatus::Available);
        let is_full = available == 0;
        self.repos.zones().set_full_flag(zone_id, is_full).await?;

        let mut available_per_floor: Vec<FloorAvailability> = (1..=zone.total_floors)
            .map(|floor| FloorAvailability {
                floor,
                available: spots
                    .iter()
                    .filter(|s| s.floor == floor && s.status == SpotStatus::Available)
                    .count() as u64,
            })
            .collect();
        available_per_floor.sort_by_key(|f| f.floor);

        Ok(ZoneStatus {
            zone_id,
            name: zone.name,
            total_spots: spots.len() as u64,
            available,
            reserved: count(SpotStatus::Reserved),
            occupied: count(SpotStatus::Occupied),
            maintenance: count(SpotStatus::Maintenance),
            out_of_service: count(SpotStatus::OutOfService),
            is_full,
            available_per_floor,
        })
    }

    /// Zero Available spots → full; refreshes the cached flag
    pub async fn is_zone_full(&self, zone_id: i32) -> DomainResult<bool> {
        self.require_zone(zone_id).await?;
        let is_full = self.repos.spots().count_available(zone_id).await? == 0;
        self.repos.zones().set_full_flag(zone_id, is_full).await?;
        Ok(is_full)
    }

    async fn require_zone(&self, zone_id: i32) -> DomainResult<ParkingZone> {
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
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::infrastructure::memory::InMemoryRepositoryProvider;

    fn service() -> (Arc<InMemoryRepositoryProvider>, ZoneService) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let service = ZoneService::new(repos.clone());
        (repos, service)
    }

    fn rate(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn create_zone_generates_the_spot_grid() {
        let (repos, svc) = service();
        let zone = svc
            .create_zone("Center", 2, 3, rate("5.00"), None)
            .await
            .unwrap();

        let spots = repos.spots().find_by_zone(zone.id, None).await.unwrap();
        assert_eq!(spots.len(), 6);
        assert!(spots.iter().all(|s| s.status == SpotStatus::Available));

        let labels: Vec<&str> = spots.iter().map(|s| s.spot_number.as_str()).collect();
        assert!(labels.contains(&"F1S1"));
        assert!(labels.contains(&"F2S3"));
    }

    #[tokio::test]
    async fn create_zone_validates_input() {
        let (_, svc) = service();
        assert!(svc.create_zone("", 1, 1, rate("5.00"), None).await.is_err());
        assert!(svc.create_zone("Z", 0, 5, rate("5.00"), None).await.is_err());
        assert!(svc.create_zone("Z", 1, 0, rate("5.00"), None).await.is_err());
        assert!(svc.create_zone("Z", 1, 1, Decimal::ZERO, None).await.is_err());
        assert!(svc
            .create_zone("Z", 1, 1, rate("-2.00"), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn status_counts_per_state_and_floor() {
        let (repos, svc) = service();
        let zone = svc
            .create_zone("Center", 2, 2, rate("5.00"), None)
            .await
            .unwrap();

        // Spot 1 (floor 1) reserved and occupied, spot 3 (floor 2) reserved
        repos.spots().reserve(1, 100).await.unwrap();
        repos.spots().occupy(1).await.unwrap();
        repos.spots().reserve(3, 101).await.unwrap();

        let status = svc.zone_status(zone.id).await.unwrap();
        assert_eq!(status.total_spots, 4);
        assert_eq!(status.available, 2);
        assert_eq!(status.reserved, 1);
        assert_eq!(status.occupied, 1);
        assert!(!status.is_full);

        assert_eq!(status.available_per_floor.len(), 2);
        assert_eq!(status.available_per_floor[0].available, 1);
        assert_eq!(status.available_per_floor[1].available, 1);
    }

    #[tokio::test]
    async fn full_flag_follows_availability() {
        let (repos, svc) = service();
        let zone = svc
            .create_zone("Tiny", 1, 1, rate("5.00"), None)
            .await
            .unwrap();

        assert!(!svc.is_zone_full(zone.id).await.unwrap());

        repos.spots().reserve(1, 55).await.unwrap();
        assert!(svc.is_zone_full(zone.id).await.unwrap());
        let reloaded = repos.zones().find_by_id(zone.id).await.unwrap().unwrap();
        assert!(reloaded.is_full);

        repos.spots().release(1).await.unwrap();
        assert!(!svc.is_zone_full(zone.id).await.unwrap());
    }

    #[tokio::test]
    async fn spot_listing_filters_by_status() {
        let (repos, svc) = service();
        let zone = svc
            .create_zone("Center", 1, 3, rate("5.00"), None)
            .await
            .unwrap();
        repos.spots().reserve(2, 7).await.unwrap();

        let reserved = svc
            .list_spots(zone.id, Some(SpotStatus::Reserved))
            .await
            .unwrap();
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].id, 2);

        let all = svc.list_spots(zone.id, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn unknown_zone_is_not_found() {
        let (_, svc) = service();
        assert!(matches!(
            svc.zone_status(42).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }
}
