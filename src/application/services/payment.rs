//! Payment recorder and payment queries
//!
//! `process` is the single write path for payments: it validates the
//! reservation's eligibility, keeps the 1:1 payment row per reservation,
//! and settles through the [`PaymentGateway`] port. Rule violations all
//! surface in the `Payment:` message family so the check-out flow can
//! distinguish them from infrastructure failures.

use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::application::ports::PaymentGateway;
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::SessionStatus;
use crate::domain::{DomainError, DomainResult};
use crate::shared::errors::PaymentError;

/// Service for payment operations
pub struct PaymentService {
    repos: Arc<dyn RepositoryProvider>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repos, gateway }
    }

    /// Record the parking fee for a checked-out session.
    ///
    /// The reservation must still be Active with its exit time recorded;
    /// the Completed transition happens in the check-out flow only after
    /// this call succeeds. A rejected charge leaves a Failed payment row
    /// that the next attempt reuses.
    pub async fn process(
        &self,
        reservation_id: i32,
        amount: Decimal,
        method: PaymentMethod,
    ) -> DomainResult<Payment> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::from(PaymentError::ReservationNotFound(reservation_id)))?;

        // A settled reservation (Completed or not) is never charged again
        if reservation.is_paid {
            return Err(PaymentError::AlreadyPaid(reservation_id).into());
        }
        // Payable once the car has checked out: still Active, exit recorded
        if reservation.status != SessionStatus::Active || reservation.exit_time.is_none() {
            return Err(PaymentError::SessionNotCompleted(reservation_id).into());
        }
        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount(amount).into());
        }

        let mut payment = match self
            .repos
            .payments()
            .find_by_reservation(reservation_id)
            .await?
        {
            Some(p) if p.status == PaymentStatus::Completed => {
                return Err(PaymentError::AlreadyPaid(reservation_id).into());
            }
            Some(mut p) => {
                // Retry after a rejection reuses the existing row
                p.amount = amount;
                p.method = method;
                p.status = PaymentStatus::Pending;
                p.completed_at = None;
                self.repos.payments().update(p.clone()).await?;
                p
            }
            None => {
                self.repos
                    .payments()
                    .save(Payment::new(reservation_id, amount, method))
                    .await?
            }
        };

        match self.gateway.charge(reservation_id, amount, method).await {
            Ok(()) => {
                payment.complete();
                self.repos.payments().update(payment.clone()).await?;
                counter!("payments_recorded_total").increment(1);
                info!(
                    "💰 Payment recorded: reservation={}, amount={}, method={}",
                    reservation_id, amount, method
                );
                Ok(payment)
            }
            Err(e) => {
                payment.fail();
                self.repos.payments().update(payment.clone()).await?;
                warn!(
                    "Payment rejected: reservation={}, amount={}: {}",
                    reservation_id, amount, e
                );
                Err(e.into())
            }
        }
    }

    /// Payment by id, scoped to its reservation's owner
    pub async fn get_payment(&self, payment_id: i32, user_id: i32) -> DomainResult<Payment> {
        let payment = self
            .repos
            .payments()
            .find_by_id(payment_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Payment",
                field: "id",
                value: payment_id.to_string(),
            })?;

        // Ownership runs through the reservation
        self.repos
            .reservations()
            .find_by_id_for_user(payment.reservation_id, user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Payment",
                field: "id",
                value: payment_id.to_string(),
            })?;

        Ok(payment)
    }

    /// The payment of one reservation, scoped to the owner
    pub async fn get_reservation_payment(
        &self,
        reservation_id: i32,
        user_id: i32,
    ) -> DomainResult<Payment> {
        self.repos
            .reservations()
            .find_by_id_for_user(reservation_id, user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Reservation",
                field: "id",
                value: reservation_id.to_string(),
            })?;

        self.repos
            .payments()
            .find_by_reservation(reservation_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Payment",
                field: "reservation_id",
                value: reservation_id.to_string(),
            })
    }

    /// All payments across the user's reservations, newest first
    pub async fn list_user_payments(&self, user_id: i32) -> DomainResult<Vec<Payment>> {
        self.repos.payments().find_by_user(user_id).await
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::application::ports::AutoApproveGateway;
    use crate::domain::reservation::Reservation;
    use crate::infrastructure::memory::InMemoryRepositoryProvider;

    struct RejectingGateway;

    #[async_trait]
    impl PaymentGateway for RejectingGateway {
        async fn charge(
            &self,
            _reservation_id: i32,
            _amount: Decimal,
            _method: PaymentMethod,
        ) -> Result<(), PaymentError> {
            Err(PaymentError::Rejected("card declined".to_string()))
        }
    }

    async fn checked_out_reservation(repos: &Arc<InMemoryRepositoryProvider>) -> i32 {
        let r = repos
            .reservations()
            .save(Reservation::new(1, 1, 1))
            .await
            .unwrap();
        repos
            .reservations()
            .begin_session(r.id, Utc::now())
            .await
            .unwrap();
        repos
            .reservations()
            .set_exit_time(r.id, Utc::now())
            .await
            .unwrap();
        r.id
    }

    fn service(
        repos: Arc<InMemoryRepositoryProvider>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> PaymentService {
        PaymentService::new(repos, gateway)
    }

    #[tokio::test]
    async fn missing_reservation_fails_with_payment_prefix() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let svc = service(repos, Arc::new(AutoApproveGateway));

        let err = svc
            .process(99, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Payment: "));
    }

    #[tokio::test]
    async fn hold_without_checkout_is_not_payable() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let r = repos
            .reservations()
            .save(Reservation::new(1, 1, 1))
            .await
            .unwrap();
        let svc = service(repos, Arc::new(AutoApproveGateway));

        let err = svc
            .process(r.id, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not completed"));
    }

    #[tokio::test]
    async fn active_session_without_exit_is_not_payable() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let r = repos
            .reservations()
            .save(Reservation::new(1, 1, 1))
            .await
            .unwrap();
        repos
            .reservations()
            .begin_session(r.id, Utc::now())
            .await
            .unwrap();
        let svc = service(repos, Arc::new(AutoApproveGateway));

        let err = svc
            .process(r.id, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not completed"));
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let id = checked_out_reservation(&repos).await;
        let svc = service(repos, Arc::new(AutoApproveGateway));

        let err = svc
            .process(id, Decimal::ZERO, PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid payment amount"));
    }

    #[tokio::test]
    async fn successful_charge_records_completed_payment() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let id = checked_out_reservation(&repos).await;
        let svc = service(repos.clone(), Arc::new(AutoApproveGateway));

        let payment = svc
            .process(id, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.completed_at.is_some());

        let stored = repos.payments().find_by_reservation(id).await.unwrap();
        assert_eq!(stored.unwrap().status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn rejected_charge_leaves_failed_row_for_retry() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let id = checked_out_reservation(&repos).await;

        let rejecting = service(repos.clone(), Arc::new(RejectingGateway));
        let err = rejecting
            .process(id, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Payment: "));

        let failed = repos
            .payments()
            .find_by_reservation(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);

        // Retry settles by updating the same row, not inserting a second one
        let approving = service(repos.clone(), Arc::new(AutoApproveGateway));
        let paid = approving
            .process(id, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(paid.id, failed.id);
        assert_eq!(paid.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn already_paid_reservation_is_rejected() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let id = checked_out_reservation(&repos).await;
        let svc = service(repos.clone(), Arc::new(AutoApproveGateway));

        svc.process(id, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap();
        // Mirror the completed transition the check-out flow performs
        repos.reservations().complete(id).await.unwrap();

        let err = svc
            .process(id, Decimal::from(10), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already paid"));
    }
}
