//! SeaORM implementation of SpotLedger
//!
//! `reserve` and `occupy` put the expected status into the WHERE clause of
//! a single UPDATE, so the row count tells the caller whether it won the
//! transition or lost it to a concurrent writer.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, UpdateResult,
};
use tracing::debug;

use crate::domain::zone::{ParkingSpot, SpotLedger, SpotStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::parking_spot;

pub struct SeaOrmSpotLedger {
    db: DatabaseConnection,
}

impl SeaOrmSpotLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: parking_spot::Model) -> ParkingSpot {
    ParkingSpot {
        id: m.id,
        zone_id: m.zone_id,
        spot_number: m.spot_number,
        floor: m.floor,
        status: SpotStatus::from_str(&m.status),
        reservation_id: m.reservation_id,
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

// ── SpotLedger impl ─────────────────────────────────────────────

#[async_trait]
impl SpotLedger for SeaOrmSpotLedger {
    async fn insert_many(&self, spots: Vec<ParkingSpot>) -> DomainResult<()> {
        debug!("Inserting {} parking spots", spots.len());

        let models: Vec<parking_spot::ActiveModel> = spots
            .into_iter()
            .map(|s| parking_spot::ActiveModel {
                id: Default::default(), // auto-increment
                zone_id: Set(s.zone_id),
                spot_number: Set(s.spot_number),
                floor: Set(s.floor),
                status: Set(s.status.as_str().to_string()),
                reservation_id: Set(s.reservation_id),
            })
            .collect();

        parking_spot::Entity::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSpot>> {
        let model = parking_spot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_zone(
        &self,
        zone_id: i32,
        status: Option<SpotStatus>,
    ) -> DomainResult<Vec<ParkingSpot>> {
        let mut query = parking_spot::Entity::find()
            .filter(parking_spot::Column::ZoneId.eq(zone_id));

        if let Some(status) = status {
            query = query.filter(parking_spot::Column::Status.eq(status.as_str()));
        }

        let models = query
            .order_by_asc(parking_spot::Column::Floor)
            .order_by_asc(parking_spot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn count_available(&self, zone_id: i32) -> DomainResult<u64> {
        parking_spot::Entity::find()
            .filter(parking_spot::Column::ZoneId.eq(zone_id))
            .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn reserve(&self, spot_id: i32, reservation_id: i32) -> DomainResult<bool> {
        let result: UpdateResult = parking_spot::Entity::update_many()
            .col_expr(
                parking_spot::Column::Status,
                sea_orm::sea_query::Expr::value(SpotStatus::Reserved.as_str()),
            )
            .col_expr(
                parking_spot::Column::ReservationId,
                sea_orm::sea_query::Expr::value(Some(reservation_id)),
            )
            .filter(parking_spot::Column::Id.eq(spot_id))
            .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn occupy(&self, spot_id: i32) -> DomainResult<bool> {
        let result: UpdateResult = parking_spot::Entity::update_many()
            .col_expr(
                parking_spot::Column::Status,
                sea_orm::sea_query::Expr::value(SpotStatus::Occupied.as_str()),
            )
            .filter(parking_spot::Column::Id.eq(spot_id))
            .filter(parking_spot::Column::Status.eq(SpotStatus::Reserved.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn release(&self, spot_id: i32) -> DomainResult<()> {
        let _: UpdateResult = parking_spot::Entity::update_many()
            .col_expr(
                parking_spot::Column::Status,
                sea_orm::sea_query::Expr::value(SpotStatus::Available.as_str()),
            )
            .col_expr(
                parking_spot::Column::ReservationId,
                sea_orm::sea_query::Expr::value(Option::<i32>::None),
            )
            .filter(parking_spot::Column::Id.eq(spot_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
