//! Payment DTOs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::payment::Payment;

/// Payment details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDto {
    pub id: i32,
    pub reservation_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<Payment> for PaymentDto {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            reservation_id: payment.reservation_id,
            amount: payment.amount,
            method: payment.method.to_string(),
            status: payment.status.to_string(),
            created_at: payment.created_at.to_rfc3339(),
            completed_at: payment.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}
