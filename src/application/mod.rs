//! Application layer: fee math, outbound ports and lifecycle services

pub mod fees;
pub mod ports;
pub mod services;

pub use ports::{AutoApproveGateway, PaymentGateway};
pub use services::{PaymentService, ReservationService, ZoneService};
