//! Reservation aggregate
//!
//! Contains the Reservation entity, its lifecycle status, and the
//! repository interface with compare-and-set transitions.

pub mod model;
pub mod repository;

pub use model::{Reservation, SessionStatus};
pub use repository::ReservationRepository;
