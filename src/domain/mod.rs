pub mod car;
pub mod payment;
pub mod repositories;
pub mod reservation;
pub mod user;
pub mod zone;

// Re-export commonly used types
pub use car::Car;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{Reservation, SessionStatus};
pub use user::{User, UserRole};
pub use zone::{ParkingSpot, ParkingZone, SpotStatus};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;
