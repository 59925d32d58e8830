//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider` — unified access to all per-aggregate repositories
//! - `DomainResult` — standard result type for domain operations

use super::car::CarRepository;
use super::payment::PaymentRepository;
use super::reservation::ReservationRepository;
use super::user::UserRepository;
use super::zone::{SpotLedger, ZoneRepository};
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let car = repos.cars().find_by_id(3).await?;
///     let open = repos.reservations().has_open_for_car(car.id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn cars(&self) -> &dyn CarRepository;
    fn zones(&self) -> &dyn ZoneRepository;
    fn spots(&self) -> &dyn SpotLedger;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn payments(&self) -> &dyn PaymentRepository;
}
