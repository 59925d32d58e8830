//! Database entities module

pub mod car;
pub mod parking_spot;
pub mod parking_zone;
pub mod payment;
pub mod reservation;
pub mod user;

pub use car::Entity as Car;
pub use parking_spot::Entity as ParkingSpot;
pub use parking_zone::Entity as ParkingZone;
pub use payment::Entity as Payment;
pub use reservation::Entity as Reservation;
pub use user::Entity as User;
