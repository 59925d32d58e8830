//! SeaORM implementation of CarRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::domain::car::{Car, CarRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::car;

pub struct SeaOrmCarRepository {
    db: DatabaseConnection,
}

impl SeaOrmCarRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: car::Model) -> Car {
    Car {
        id: m.id,
        user_id: m.user_id,
        plate_number: m.plate_number,
        model: m.model,
        color: m.color,
        created_at: m.created_at,
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

// ── CarRepository impl ──────────────────────────────────────────

#[async_trait]
impl CarRepository for SeaOrmCarRepository {
    async fn save(&self, c: Car) -> DomainResult<Car> {
        debug!("Saving car: {} for user {}", c.plate_number, c.user_id);

        let model = car::ActiveModel {
            id: Default::default(), // auto-increment
            user_id: Set(c.user_id),
            plate_number: Set(c.plate_number),
            model: Set(c.model),
            color: Set(c.color),
            created_at: Set(c.created_at),
        };

        let inserted = model.insert(&self.db).await.map_err(|e| {
            if e.to_string().contains("UNIQUE") || e.to_string().contains("duplicate") {
                DomainError::Validation("Plate number already registered".to_string())
            } else {
                db_err(e)
            }
        })?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Car>> {
        let model = car::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_plate(&self, plate_number: &str) -> DomainResult<Option<Car>> {
        let model = car::Entity::find()
            .filter(car::Column::PlateNumber.eq(plate_number.to_uppercase()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Car>> {
        let models = car::Entity::find()
            .filter(car::Column::UserId.eq(user_id))
            .order_by_desc(car::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
