//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::domain::payment::{Payment, PaymentMethod, PaymentRepository, PaymentStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{payment, reservation};

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: payment::Model) -> Payment {
    Payment {
        id: m.id,
        reservation_id: m.reservation_id,
        amount: m.amount,
        method: PaymentMethod::from_str(&m.method).unwrap_or(PaymentMethod::Online),
        status: PaymentStatus::from_str(&m.status),
        created_at: m.created_at,
        completed_at: m.completed_at,
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

// ── PaymentRepository impl ──────────────────────────────────────

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn save(&self, p: Payment) -> DomainResult<Payment> {
        debug!(
            "Saving payment: reservation={}, amount={}, method={}",
            p.reservation_id, p.amount, p.method
        );

        let model = payment::ActiveModel {
            id: Default::default(), // auto-increment
            reservation_id: Set(p.reservation_id),
            amount: Set(p.amount),
            method: Set(p.method.as_str().to_string()),
            status: Set(p.status.as_str().to_string()),
            created_at: Set(p.created_at),
            completed_at: Set(p.completed_at),
        };

        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn update(&self, p: Payment) -> DomainResult<()> {
        debug!("Updating payment: {} -> {}", p.id, p.status);

        let existing = payment::Entity::find_by_id(p.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Err(DomainError::NotFound {
                entity: "Payment",
                field: "id",
                value: p.id.to_string(),
            });
        };

        let mut active: payment::ActiveModel = existing.into();
        active.amount = Set(p.amount);
        active.method = Set(p.method.as_str().to_string());
        active.status = Set(p.status.as_str().to_string());
        active.completed_at = Set(p.completed_at);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find()
            .filter(payment::Column::ReservationId.eq(reservation_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Payment>> {
        let reservation_ids: Vec<i32> = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|r| r.id)
            .collect();

        if reservation_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = payment::Entity::find()
            .filter(payment::Column::ReservationId.is_in(reservation_ids))
            .order_by_desc(payment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
