//! Application services

mod expiry;
mod payment;
mod reservation;
mod zone;

pub use expiry::{
    emit_cancellation_warnings, start_expiry_sweep_task, start_warning_task,
    sweep_expired_reservations,
};
pub use payment::PaymentService;
pub use reservation::ReservationService;
pub use zone::{FloorAvailability, ZoneService, ZoneStatus};
