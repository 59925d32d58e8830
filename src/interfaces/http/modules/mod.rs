//! Route modules, one directory per API surface

pub mod cars;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod reservations;
pub mod zones;
