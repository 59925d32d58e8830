//! Parking zone aggregate
//!
//! Contains the zone and spot entities, the repository interface, and the
//! spot ledger (the sole mutation path for spot occupancy).

pub mod model;
pub mod repository;

pub use model::{ParkingSpot, ParkingZone, SpotStatus};
pub use repository::{SpotLedger, ZoneRepository};
