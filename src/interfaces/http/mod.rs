//! HTTP REST API interfaces
//!
//! - `common`: Response envelope, error mapping and validated extractors
//! - `middleware`: JWT bearer authentication
//! - `modules`: One directory per API surface (cars, zones, reservations, ...)
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiContext};
