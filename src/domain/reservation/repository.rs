//! Reservation repository interface
//!
//! Transition methods (`begin_session`, `complete`, `cancel_hold`,
//! `expire_hold`) are compare-and-set: the status predicate is part of the
//! write, and `false` means another caller won the race. Loading first and
//! then blindly updating would let two concurrent check-ins both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::model::Reservation;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation and return it with its assigned id
    async fn save(&self, reservation: Reservation) -> DomainResult<Reservation>;

    /// Store the QR token generated after the row got its id
    async fn set_token(&self, id: i32, qr_token: &str) -> DomainResult<()>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    /// Find a reservation scoped to its owner
    async fn find_by_id_for_user(&self, id: i32, user_id: i32)
        -> DomainResult<Option<Reservation>>;

    /// All reservations of a user, newest first
    async fn find_for_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>>;

    /// Does the car have a reservation in Reserved or Active?
    async fn has_open_for_car(&self, car_id: i32) -> DomainResult<bool>;

    /// Reserved with no entry time → Active + entry time.
    /// Returns `false` if the reservation was not in that state.
    async fn begin_session(&self, id: i32, entry_time: DateTime<Utc>) -> DomainResult<bool>;

    /// Record the check-out timestamp, only if none is set yet.
    /// Returns `false` when an earlier attempt already stored one.
    async fn set_exit_time(&self, id: i32, exit_time: DateTime<Utc>) -> DomainResult<bool>;

    /// Store the computed fee
    async fn set_total_amount(&self, id: i32, amount: Decimal) -> DomainResult<()>;

    /// Active → Completed + paid. Returns `false` if not Active.
    async fn complete(&self, id: i32) -> DomainResult<bool>;

    /// Reserved → Cancelled with the cancellation fee as total amount.
    /// Returns `false` if not Reserved.
    async fn cancel_hold(&self, id: i32, fee: Decimal) -> DomainResult<bool>;

    /// Reserved → Cancelled by the expiry sweep, clearing the paid flag.
    /// Returns `false` if the hold was already gone (lost race, not an error).
    async fn expire_hold(&self, id: i32) -> DomainResult<bool>;

    /// Reserved holds created at or before the cutoff (sweep candidates)
    async fn find_reserved_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>>;

    /// Reserved holds created inside (from, to] (warning-window candidates)
    async fn find_reserved_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>>;
}
