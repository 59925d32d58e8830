//! Outbound ports — interfaces the application layer needs from the outside
//! world.
//!
//! [`PaymentGateway`] decouples the payment recorder from the payment
//! backend. The production implementation is [`AutoApproveGateway`], which
//! records the charge without talking to an external processor; tests swap
//! in a rejecting double to exercise the failure path.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::payment::PaymentMethod;
use crate::shared::errors::PaymentError;

/// Port for settling a parking fee against a payment backend.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempt to charge `amount` for `reservation_id`.
    ///
    /// `Ok(())` means the charge went through; a rejection surfaces as
    /// [`PaymentError::Rejected`].
    async fn charge(
        &self,
        reservation_id: i32,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<(), PaymentError>;
}

/// Gateway that approves every charge.
///
/// Stands in for the external processor until one is integrated; the
/// recorder's validation rules still run in front of it.
pub struct AutoApproveGateway;

#[async_trait]
impl PaymentGateway for AutoApproveGateway {
    async fn charge(
        &self,
        reservation_id: i32,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<(), PaymentError> {
        info!(
            "💳 Charge approved: reservation={}, amount={}, method={}",
            reservation_id, amount, method
        );
        Ok(())
    }
}
