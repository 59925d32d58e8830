//! Payment HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::application::services::PaymentService;
use crate::interfaces::http::common::{ApiError, ApiResponse};
use crate::interfaces::http::middleware::AuthenticatedUser;

use super::dto::*;

/// Application state for payment handlers
#[derive(Clone)]
pub struct PaymentsState {
    pub service: Arc<PaymentService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/me",
    tag = "Payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments of the calling user, newest first", body = ApiResponse<Vec<PaymentDto>>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_payments(
    State(state): State<PaymentsState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<PaymentDto>>>, ApiError> {
    let payments = state.service.list_user_payments(user.user_id).await?;
    let dtos: Vec<PaymentDto> = payments.into_iter().map(PaymentDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}",
    tag = "Payments",
    security(("bearer_auth" = [])),
    params(("payment_id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment details", body = ApiResponse<PaymentDto>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not owned by the caller")
    )
)]
pub async fn get_payment(
    State(state): State<PaymentsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(payment_id): Path<i32>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    let payment = state.service.get_payment(payment_id, user.user_id).await?;
    Ok(Json(ApiResponse::success(payment.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/reservation/{reservation_id}",
    tag = "Payments",
    security(("bearer_auth" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Payment of the reservation", body = ApiResponse<PaymentDto>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Reservation or payment not found")
    )
)]
pub async fn reservation_payment(
    State(state): State<PaymentsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(reservation_id): Path<i32>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    let payment = state
        .service
        .get_reservation_payment(reservation_id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(payment.into())))
}
