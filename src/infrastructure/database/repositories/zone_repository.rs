//! SeaORM implementation of ZoneRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    UpdateResult,
};
use tracing::debug;

use crate::domain::zone::{ParkingZone, ZoneRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::parking_zone;

pub struct SeaOrmZoneRepository {
    db: DatabaseConnection,
}

impl SeaOrmZoneRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: parking_zone::Model) -> ParkingZone {
    ParkingZone {
        id: m.id,
        name: m.name,
        total_floors: m.total_floors,
        spots_per_floor: m.spots_per_floor,
        hourly_rate: m.hourly_rate,
        is_full: m.is_full,
        description: m.description,
        created_at: m.created_at,
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

// ── ZoneRepository impl ─────────────────────────────────────────

#[async_trait]
impl ZoneRepository for SeaOrmZoneRepository {
    async fn save(&self, z: ParkingZone) -> DomainResult<ParkingZone> {
        debug!(
            "Saving parking zone: {} ({} floors x {} spots)",
            z.name, z.total_floors, z.spots_per_floor
        );

        let model = parking_zone::ActiveModel {
            id: Default::default(), // auto-increment
            name: Set(z.name),
            total_floors: Set(z.total_floors),
            spots_per_floor: Set(z.spots_per_floor),
            hourly_rate: Set(z.hourly_rate),
            is_full: Set(z.is_full),
            description: Set(z.description),
            created_at: Set(z.created_at),
        };

        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingZone>> {
        let model = parking_zone::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingZone>> {
        let models = parking_zone::Entity::find()
            .order_by_asc(parking_zone::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn set_full_flag(&self, zone_id: i32, is_full: bool) -> DomainResult<()> {
        let _: UpdateResult = parking_zone::Entity::update_many()
            .col_expr(
                parking_zone::Column::IsFull,
                sea_orm::sea_query::Expr::value(is_full),
            )
            .filter(parking_zone::Column::Id.eq(zone_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
