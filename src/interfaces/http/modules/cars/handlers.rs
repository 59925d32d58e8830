//! Car HTTP handlers

use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};

use crate::domain::car::Car;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

use super::dto::*;

/// Application state for car handlers
#[derive(Clone)]
pub struct CarsState {
    pub repos: Arc<dyn RepositoryProvider>,
}

#[utoipa::path(
    post,
    path = "/api/v1/cars",
    tag = "Cars",
    security(("bearer_auth" = [])),
    request_body = RegisterCarRequest,
    responses(
        (status = 200, description = "Car registered", body = ApiResponse<CarDto>),
        (status = 400, description = "Invalid plate number or duplicate plate"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn register_car(
    State(state): State<CarsState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<RegisterCarRequest>,
) -> Result<Json<ApiResponse<CarDto>>, ApiError> {
    let car = Car::new(
        0,
        user.user_id,
        request.plate_number,
        request.model,
        request.color,
    );
    if let Some(existing) = state.repos.cars().find_by_plate(&car.plate_number).await? {
        return Err(DomainError::Validation(format!(
            "plate number {} is already registered",
            existing.plate_number
        ))
        .into());
    }
    let saved = state.repos.cars().save(car).await?;

    tracing::info!(
        "🚙 Car {} registered for user {}",
        saved.plate_number,
        user.user_id
    );
    Ok(Json(ApiResponse::success(saved.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/cars/me",
    tag = "Cars",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cars of the calling user", body = ApiResponse<Vec<CarDto>>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_cars(
    State(state): State<CarsState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<CarDto>>>, ApiError> {
    let cars = state.repos.cars().find_by_user(user.user_id).await?;
    let dtos: Vec<CarDto> = cars.into_iter().map(CarDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}
