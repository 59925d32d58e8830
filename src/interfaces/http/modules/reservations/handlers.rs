//! Reservation HTTP handlers
//!
//! Two families of routes share this module: authenticated user routes
//! (create, list, cancel, fee quotes) and the unauthenticated gate routes
//! (`/start`, `/end`) where the QR token plus the scanned plate are the
//! credential.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::application::services::ReservationService;
use crate::domain::payment::PaymentMethod;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::Reservation;
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

use super::dto::*;

/// Application state for reservation handlers
#[derive(Clone)]
pub struct ReservationsState {
    pub service: Arc<ReservationService>,
    pub repos: Arc<dyn RepositoryProvider>,
}

impl ReservationsState {
    /// Resolves the nested car and spot views. Lookup failures degrade to
    /// `None` rather than failing the whole response.
    async fn to_dto(&self, reservation: Reservation) -> ReservationDto {
        let car = self
            .repos
            .cars()
            .find_by_id(reservation.car_id)
            .await
            .ok()
            .flatten();
        let spot = self
            .repos
            .spots()
            .find_by_id(reservation.spot_id)
            .await
            .ok()
            .flatten();
        ReservationDto::assemble(reservation, car, spot)
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 200, description = "Spot reserved, QR token issued", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Car already has an open reservation, zone full, or spot taken"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Car, zone or spot not found")
    )
)]
pub async fn create_reservation(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateReservationRequest>,
) -> Result<Json<ApiResponse<ReservationDto>>, ApiError> {
    let reservation = state
        .service
        .create_reservation(
            user.user_id,
            request.car_id,
            request.spot_id,
            request.zone_id,
        )
        .await?;
    let dto = state.to_dto(reservation).await;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/me",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reservations of the calling user, newest first", body = ApiResponse<Vec<ReservationDto>>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_reservations(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<ReservationDto>>>, ApiError> {
    let reservations = state.service.get_user_reservations(user.user_id).await?;
    let mut dtos = Vec::with_capacity(reservations.len());
    for reservation in reservations {
        dtos.push(state.to_dto(reservation).await);
    }
    Ok(Json(ApiResponse::success(dtos)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/start",
    tag = "Gate",
    request_body = StartParkingRequest,
    responses(
        (status = 200, description = "Check-in accepted, session active", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Bad token, stale token, plate mismatch or wrong state")
    )
)]
pub async fn start_parking(
    State(state): State<ReservationsState>,
    ValidatedJson(request): ValidatedJson<StartParkingRequest>,
) -> Result<Json<ApiResponse<ReservationDto>>, ApiError> {
    let reservation = state
        .service
        .start_parking(&request.qr_code, &request.plate_number)
        .await?;
    let dto = state.to_dto(reservation).await;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/end",
    tag = "Gate",
    request_body = EndParkingRequest,
    responses(
        (status = 200, description = "Checked out and paid", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Bad token, plate mismatch, wrong state or rejected payment")
    )
)]
pub async fn end_parking(
    State(state): State<ReservationsState>,
    ValidatedJson(request): ValidatedJson<EndParkingRequest>,
) -> Result<Json<ApiResponse<ReservationDto>>, ApiError> {
    let method = PaymentMethod::from_str(&request.payment_method).ok_or_else(|| {
        ApiError(DomainError::Validation(format!(
            "Unknown payment method '{}'",
            request.payment_method
        )))
    })?;

    let reservation = state
        .service
        .end_parking(&request.qr_code, &request.plate_number, method)
        .await?;
    let dto = state.to_dto(reservation).await;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/cancel",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Hold cancelled, spot released", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Reservation already started or finished"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not owned by the caller")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(reservation_id): Path<i32>,
) -> Result<Json<ApiResponse<ReservationDto>>, ApiError> {
    let reservation = state
        .service
        .cancel_reservation(reservation_id, user.user_id)
        .await?;
    let dto = state.to_dto(reservation).await;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{reservation_id}/fee",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Fee as if the car left now", body = ApiResponse<FeeDto>),
        (status = 400, description = "Reservation is not an active session"),
        (status = 404, description = "Not found or not owned by the caller")
    )
)]
pub async fn parking_fee(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(reservation_id): Path<i32>,
) -> Result<Json<ApiResponse<FeeDto>>, ApiError> {
    let amount = state
        .service
        .get_parking_fee(reservation_id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(FeeDto {
        reservation_id,
        amount,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{reservation_id}/cancellation-fee",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "What cancelling the hold would cost now", body = ApiResponse<FeeDto>),
        (status = 400, description = "Reservation is not a pending hold"),
        (status = 404, description = "Not found or not owned by the caller")
    )
)]
pub async fn cancellation_fee(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(reservation_id): Path<i32>,
) -> Result<Json<ApiResponse<FeeDto>>, ApiError> {
    let amount = state
        .service
        .get_cancellation_fee(reservation_id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(FeeDto {
        reservation_id,
        amount,
    })))
}
