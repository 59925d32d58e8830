//! Reservation lifecycle and gate endpoints

pub mod dto;
pub mod handlers;

pub use handlers::*;
