//! Payment repository interface

use async_trait::async_trait;

use super::model::Payment;
use crate::domain::DomainResult;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new payment and return it with its assigned id
    async fn save(&self, payment: Payment) -> DomainResult<Payment>;

    /// Persist a status change of an existing payment
    async fn update(&self, payment: Payment) -> DomainResult<()>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Payment>>;

    /// The 1:1 payment of a reservation, if recorded
    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Option<Payment>>;

    /// All payments across a user's reservations, newest first
    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Payment>>;
}
