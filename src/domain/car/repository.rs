//! Car repository interface

use async_trait::async_trait;

use super::model::Car;
use crate::domain::DomainResult;

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn save(&self, car: Car) -> DomainResult<Car>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Car>>;
    async fn find_by_plate(&self, plate_number: &str) -> DomainResult<Option<Car>>;
    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Car>>;
}
