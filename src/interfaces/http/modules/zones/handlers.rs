//! Zone HTTP handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use crate::application::services::ZoneService;
use crate::domain::zone::SpotStatus;
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

use super::dto::*;

/// Application state for zone handlers
#[derive(Clone)]
pub struct ZonesState {
    pub service: Arc<ZoneService>,
}

/// Parses a `?status=` query value strictly. `SpotStatus::from_str` folds
/// unknown strings into OutOfService, which would silently filter by the
/// wrong status here.
fn parse_spot_status(raw: &str) -> Result<SpotStatus, ApiError> {
    match raw {
        "Available" => Ok(SpotStatus::Available),
        "Reserved" => Ok(SpotStatus::Reserved),
        "Occupied" => Ok(SpotStatus::Occupied),
        "Maintenance" => Ok(SpotStatus::Maintenance),
        "OutOfService" => Ok(SpotStatus::OutOfService),
        other => Err(ApiError(DomainError::Validation(format!(
            "Unknown spot status '{}'",
            other
        )))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/zones",
    tag = "Zones",
    security(("bearer_auth" = [])),
    request_body = CreateZoneRequest,
    responses(
        (status = 200, description = "Zone created with its spot grid", body = ApiResponse<ZoneDto>),
        (status = 400, description = "Invalid zone parameters"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_zone(
    State(state): State<ZonesState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateZoneRequest>,
) -> Result<Json<ApiResponse<ZoneDto>>, ApiError> {
    if !user.is_admin() {
        return Err(ApiError(DomainError::Unauthorized(
            "Only administrators can create zones".to_string(),
        )));
    }

    let zone = state
        .service
        .create_zone(
            &request.name,
            request.total_floors,
            request.spots_per_floor,
            request.hourly_rate,
            request.description,
        )
        .await?;
    Ok(Json(ApiResponse::success(zone.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/zones",
    tag = "Zones",
    responses(
        (status = 200, description = "All parking zones", body = ApiResponse<Vec<ZoneDto>>)
    )
)]
pub async fn list_zones(
    State(state): State<ZonesState>,
) -> Result<Json<ApiResponse<Vec<ZoneDto>>>, ApiError> {
    let zones = state.service.list_zones().await?;
    let dtos: Vec<ZoneDto> = zones.into_iter().map(ZoneDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

#[utoipa::path(
    get,
    path = "/api/v1/zones/{zone_id}/spots",
    tag = "Zones",
    params(
        ("zone_id" = i32, Path, description = "Zone ID"),
        ("status" = Option<String>, Query, description = "Filter by spot status")
    ),
    responses(
        (status = 200, description = "Spots of the zone", body = ApiResponse<Vec<SpotDto>>),
        (status = 400, description = "Unknown status filter"),
        (status = 404, description = "Zone not found")
    )
)]
pub async fn list_spots(
    State(state): State<ZonesState>,
    Path(zone_id): Path<i32>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<Vec<SpotDto>>>, ApiError> {
    let status = params
        .get("status")
        .map(|raw| parse_spot_status(raw))
        .transpose()?;

    let spots = state.service.list_spots(zone_id, status).await?;
    let dtos: Vec<SpotDto> = spots.into_iter().map(SpotDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

#[utoipa::path(
    get,
    path = "/api/v1/zones/{zone_id}/status",
    tag = "Zones",
    params(("zone_id" = i32, Path, description = "Zone ID")),
    responses(
        (status = 200, description = "Occupancy breakdown", body = ApiResponse<ZoneStatusDto>),
        (status = 404, description = "Zone not found")
    )
)]
pub async fn zone_status(
    State(state): State<ZonesState>,
    Path(zone_id): Path<i32>,
) -> Result<Json<ApiResponse<ZoneStatusDto>>, ApiError> {
    let status = state.service.zone_status(zone_id).await?;
    Ok(Json(ApiResponse::success(status.into())))
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_parse() {
        assert_eq!(parse_spot_status("Available").unwrap(), SpotStatus::Available);
        assert_eq!(parse_spot_status("Occupied").unwrap(), SpotStatus::Occupied);
    }

    #[test]
    fn unknown_status_is_rejected_not_defaulted() {
        assert!(parse_spot_status("Free").is_err());
        assert!(parse_spot_status("available").is_err());
    }
}
