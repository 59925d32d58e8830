//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::services::{PaymentService, ReservationService, ZoneService};
use crate::domain::repositories::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::{cars, health, metrics, payments, reservations, zones};

/// Everything the HTTP surface needs, assembled once at startup
#[derive(Clone)]
pub struct ApiContext {
    pub repos: Arc<dyn RepositoryProvider>,
    pub db: DatabaseConnection,
    pub jwt_config: JwtConfig,
    pub reservation_service: Arc<ReservationService>,
    pub zone_service: Arc<ZoneService>,
    pub payment_service: Arc<PaymentService>,
    pub prometheus_handle: PrometheusHandle,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::handlers::health_check,
        // Cars
        cars::handlers::register_car,
        cars::handlers::list_my_cars,
        // Zones
        zones::handlers::create_zone,
        zones::handlers::list_zones,
        zones::handlers::list_spots,
        zones::handlers::zone_status,
        // Reservations
        reservations::handlers::create_reservation,
        reservations::handlers::my_reservations,
        reservations::handlers::start_parking,
        reservations::handlers::end_parking,
        reservations::handlers::cancel_reservation,
        reservations::handlers::parking_fee,
        reservations::handlers::cancellation_fee,
        // Payments
        payments::handlers::my_payments,
        payments::handlers::get_payment,
        payments::handlers::reservation_payment,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            // Health
            health::HealthResponse,
            health::ComponentHealth,
            // Cars
            cars::dto::RegisterCarRequest,
            cars::dto::CarDto,
            // Zones
            zones::dto::CreateZoneRequest,
            zones::dto::ZoneDto,
            zones::dto::SpotDto,
            zones::dto::ZoneStatusDto,
            zones::dto::FloorAvailabilityDto,
            // Reservations
            reservations::dto::CreateReservationRequest,
            reservations::dto::StartParkingRequest,
            reservations::dto::EndParkingRequest,
            reservations::dto::ReservationDto,
            reservations::dto::CarView,
            reservations::dto::SpotView,
            reservations::dto::FeeDto,
            // Payments
            payments::dto::PaymentDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Cars", description = "Vehicle registration for the calling user"),
        (name = "Zones", description = "Parking zones, spot grids and occupancy"),
        (name = "Reservations", description = "Spot holds and their lifecycle"),
        (name = "Gate", description = "Entry/exit gate check-in and check-out by QR token"),
        (name = "Payments", description = "Settlement records for completed sessions"),
    ),
    info(
        title = "Parking Reservation API",
        version = "1.0.0",
        description = "REST API for parking spot reservations, gate sessions and fees",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(ctx: ApiContext) -> Router {
    let middleware_state = AuthState {
        jwt_config: ctx.jwt_config.clone(),
    };

    let health_state = health::HealthState {
        db: ctx.db.clone(),
        started_at: Arc::new(Instant::now()),
    };

    let metrics_state = metrics::MetricsState {
        handle: ctx.prometheus_handle.clone(),
    };

    let cars_state = cars::CarsState {
        repos: ctx.repos.clone(),
    };

    let zones_state = zones::ZonesState {
        service: ctx.zone_service.clone(),
    };

    let reservations_state = reservations::ReservationsState {
        service: ctx.reservation_service.clone(),
        repos: ctx.repos.clone(),
    };

    let payments_state = payments::PaymentsState {
        service: ctx.payment_service.clone(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Zone routes: reads are public, creation is admin-only (checked in the
    // handler) and therefore behind auth
    let zone_read_routes = Router::new()
        .route("/", get(zones::list_zones))
        .route("/{zone_id}/spots", get(zones::list_spots))
        .route("/{zone_id}/status", get(zones::zone_status))
        .with_state(zones_state.clone());

    let zone_admin_routes = Router::new()
        .route("/", post(zones::create_zone))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(zones_state);

    // Car routes (protected)
    let car_routes = Router::new()
        .route("/", post(cars::register_car))
        .route("/me", get(cars::list_my_cars))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(cars_state);

    // Gate routes: the QR token plus the scanned plate are the credential,
    // so no bearer token is required at the barrier
    let gate_routes = Router::new()
        .route("/start", post(reservations::start_parking))
        .route("/end", post(reservations::end_parking))
        .with_state(reservations_state.clone());

    // Reservation routes (protected)
    let reservation_routes = Router::new()
        .route("/", post(reservations::create_reservation))
        .route("/me", get(reservations::my_reservations))
        .route(
            "/{reservation_id}/cancel",
            post(reservations::cancel_reservation),
        )
        .route("/{reservation_id}/fee", get(reservations::parking_fee))
        .route(
            "/{reservation_id}/cancellation-fee",
            get(reservations::cancellation_fee),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(reservations_state);

    // Payment routes (protected)
    let payment_routes = Router::new()
        .route("/me", get(payments::my_payments))
        .route(
            "/reservation/{reservation_id}",
            get(payments::reservation_payment),
        )
        .route("/{payment_id}", get(payments::get_payment))
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(payments_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health + metrics
        .route("/health", get(health::health_check).with_state(health_state))
        .route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(metrics_state),
        )
        // Zones
        .nest("/api/v1/zones", zone_read_routes)
        .nest("/api/v1/zones", zone_admin_routes)
        // Cars
        .nest("/api/v1/cars", car_routes)
        // Reservations: gate endpoints first, then the protected surface
        .nest("/api/v1/reservations", gate_routes)
        .nest("/api/v1/reservations", reservation_routes)
        // Payments
        .nest("/api/v1/payments", payment_routes)
        // Middleware
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
