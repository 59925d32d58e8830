//! # Parking Reservation Service
//!
//! Backend for reserving parking spots, running gate check-in/check-out
//! sessions and settling fees.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, repository traits and errors
//! - **application**: Services (reservations, zones, payments, expiry sweeps) and fee rules
//! - **infrastructure**: SeaORM persistence, in-memory provider, QR/JWT crypto
//! - **interfaces**: REST API with Swagger documentation
//! - **notifications**: Broadcast event bus for reservation lifecycle events

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, init_tracing, AppConfig};

// Re-export database types for easy access
pub use infrastructure::database::repositories::SeaOrmRepositoryProvider;
pub use infrastructure::{init_database, DatabaseConfig, InMemoryRepositoryProvider};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiContext};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
