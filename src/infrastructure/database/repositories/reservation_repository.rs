//! SeaORM implementation of ReservationRepository
//!
//! Lifecycle transitions run as conditional UPDATEs with the expected
//! status in the WHERE clause. `rows_affected == 0` means the reservation
//! was no longer in that state, and the caller handles the lost race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    UpdateResult,
};
use tracing::debug;

use crate::domain::reservation::{Reservation, ReservationRepository, SessionStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::reservation;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.id,
        user_id: m.user_id,
        car_id: m.car_id,
        spot_id: m.spot_id,
        created_at: m.created_at,
        entry_time: m.entry_time,
        exit_time: m.exit_time,
        total_amount: m.total_amount,
        qr_token: m.qr_token,
        is_paid: m.is_paid,
        status: SessionStatus::from_str(&m.status),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn save(&self, r: Reservation) -> DomainResult<Reservation> {
        debug!(
            "Saving reservation: user={}, car={}, spot={}",
            r.user_id, r.car_id, r.spot_id
        );

        let model = reservation::ActiveModel {
            id: Default::default(), // auto-increment
            user_id: Set(r.user_id),
            car_id: Set(r.car_id),
            spot_id: Set(r.spot_id),
            created_at: Set(r.created_at),
            entry_time: Set(r.entry_time),
            exit_time: Set(r.exit_time),
            total_amount: Set(r.total_amount),
            qr_token: Set(r.qr_token),
            is_paid: Set(r.is_paid),
            status: Set(r.status.as_str().to_string()),
        };

        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn set_token(&self, id: i32, qr_token: &str) -> DomainResult<()> {
        let _: UpdateResult = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::QrToken,
                sea_orm::sea_query::Expr::value(qr_token),
            )
            .filter(reservation::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_id_for_user(
        &self,
        id: i32,
        user_id: i32,
    ) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_for_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .order_by_desc(reservation::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn has_open_for_car(&self, car_id: i32) -> DomainResult<bool> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::CarId.eq(car_id))
            .filter(reservation::Column::Status.is_in([
                SessionStatus::Reserved.as_str(),
                SessionStatus::Active.as_str(),
            ]))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.is_some())
    }

    async fn begin_session(&self, id: i32, entry_time: DateTime<Utc>) -> DomainResult<bool> {
        let result: UpdateResult = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::Status,
                sea_orm::sea_query::Expr::value(SessionStatus::Active.as_str()),
            )
            .col_expr(
                reservation::Column::EntryTime,
                sea_orm::sea_query::Expr::value(entry_time),
            )
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(SessionStatus::Reserved.as_str()))
            .filter(reservation::Column::EntryTime.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn set_exit_time(&self, id: i32, exit_time: DateTime<Utc>) -> DomainResult<bool> {
        let result: UpdateResult = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::ExitTime,
                sea_orm::sea_query::Expr::value(exit_time),
            )
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::ExitTime.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn set_total_amount(&self, id: i32, amount: Decimal) -> DomainResult<()> {
        let _: UpdateResult = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::TotalAmount,
                sea_orm::sea_query::Expr::value(amount),
            )
            .filter(reservation::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn complete(&self, id: i32) -> DomainResult<bool> {
        let result: UpdateResult = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::Status,
                sea_orm::sea_query::Expr::value(SessionStatus::Completed.as_str()),
            )
            .col_expr(
                reservation::Column::IsPaid,
                sea_orm::sea_query::Expr::value(true),
            )
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(SessionStatus::Active.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn cancel_hold(&self, id: i32, fee: Decimal) -> DomainResult<bool> {
        let result: UpdateResult = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::Status,
                sea_orm::sea_query::Expr::value(SessionStatus::Cancelled.as_str()),
            )
            .col_expr(
                reservation::Column::TotalAmount,
                sea_orm::sea_query::Expr::value(fee),
            )
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(SessionStatus::Reserved.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn expire_hold(&self, id: i32) -> DomainResult<bool> {
        let result: UpdateResult = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::Status,
                sea_orm::sea_query::Expr::value(SessionStatus::Cancelled.as_str()),
            )
            .col_expr(
                reservation::Column::IsPaid,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(SessionStatus::Reserved.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn find_reserved_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(SessionStatus::Reserved.as_str()))
            .filter(reservation::Column::CreatedAt.lte(cutoff))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_reserved_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(SessionStatus::Reserved.as_str()))
            .filter(reservation::Column::CreatedAt.gt(from))
            .filter(reservation::Column::CreatedAt.lte(to))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
