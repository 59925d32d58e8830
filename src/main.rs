//! Parking reservation service
//!
//! REST API for parking spot reservations, gate sessions and fees.
//! Reads configuration from a TOML file (~/.config/parking-service/config.toml).

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use parking_service::application::services::{
    start_expiry_sweep_task, start_warning_task, PaymentService, ReservationService, ZoneService,
};
use parking_service::application::AutoApproveGateway;
use parking_service::config::init_tracing;
use parking_service::domain::RepositoryProvider;
use parking_service::infrastructure::crypto::jwt::JwtConfig;
use parking_service::infrastructure::crypto::QrTokenCodec;
use parking_service::infrastructure::database::migrator::Migrator;
use parking_service::shared::shutdown::ShutdownCoordinator;
use parking_service::{
    create_api_router, create_event_bus, default_config_path, init_database, ApiContext, AppConfig,
    DatabaseConfig, SeaOrmRepositoryProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("PARKING_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg);
            error!("Failed to load config: {}. Using defaults.", e);
            cfg
        }
    };

    info!("Starting parking reservation service...");

    // ── Prometheus metrics recorder (before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {}", e))?;
    info!("📊 Prometheus metrics recorder installed");

    // ── Sub-configs from AppConfig ─────────────────────────────
    let db_config = DatabaseConfig {
        url: app_cfg.database.connection_url(),
    };
    info!("Database: {}", db_config.url);

    let jwt_config = JwtConfig {
        secret: app_cfg.security.jwt_secret.clone(),
        expiration_hours: app_cfg.security.jwt_expiration_hours,
        issuer: "parking-service".to_string(),
    };
    info!(
        "JWT configured with {}h token expiration",
        jwt_config.expiration_hours
    );

    let qr_codec = QrTokenCodec::new(&app_cfg.security.qr_secret_hex)?;

    // ── Database ───────────────────────────────────────────────
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    // ── Event bus ──────────────────────────────────────────────
    let event_bus = create_event_bus();
    info!("🔔 Event bus initialized for reservation notifications");

    // ── Services ───────────────────────────────────────────────
    let payment_service = Arc::new(PaymentService::new(
        repos.clone(),
        Arc::new(AutoApproveGateway),
    ));
    let reservation_service = Arc::new(ReservationService::new(
        repos.clone(),
        qr_codec,
        payment_service.clone(),
        event_bus.clone(),
        app_cfg.reservations.clone(),
    ));
    let zone_service = Arc::new(ZoneService::new(repos.clone()));

    // ── Shutdown coordination ──────────────────────────────────
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── Background sweeps ──────────────────────────────────────
    start_expiry_sweep_task(
        repos.clone(),
        event_bus.clone(),
        shutdown_signal.clone(),
        app_cfg.reservations.clone(),
    );
    start_warning_task(
        repos.clone(),
        event_bus,
        shutdown_signal.clone(),
        app_cfg.reservations.clone(),
    );

    // ── REST API ───────────────────────────────────────────────
    let api_router = create_api_router(ApiContext {
        repos,
        db: db.clone(),
        jwt_config,
        reservation_service,
        zone_service,
        payment_service,
        prometheus_handle,
    });

    let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let api_server = axum::serve(
        listener,
        api_router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("🛑 REST API server received shutdown signal");
    });

    info!("🚀 Server started. Press Ctrl+C to shutdown gracefully.");

    if let Err(e) = api_server.await {
        error!("REST API server error: {}", e);
    }

    // Final cleanup
    info!("🧹 Performing final cleanup...");
    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("✅ Database connection closed");
    }

    info!("👋 Parking reservation service shutdown complete");
    Ok(())
}
