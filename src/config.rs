//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/parking-service/config.toml`,
//! overridable via `PARKING_CONFIG`). Every section has defaults so a missing
//! or partial file still yields a runnable configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub reservations: ReservationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// REST API bind host
    pub api_host: String,
    /// REST API bind port
    pub api_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SeaORM connection URL, e.g. `sqlite://parking.db?mode=rwc`
    pub url: String,
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.url.clone())
    }
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://parking.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Secret for signing API JWTs
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    /// Hex-encoded HMAC key for QR tokens, at least 32 hex chars (128 bits).
    /// Rotating it invalidates every outstanding token.
    pub qr_secret_hex: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-jwt-secret-change-me".to_string(),
            jwt_expiration_hours: 24,
            qr_secret_hex: "8f3a1c5e9b2d74068c1f5a3e7d90b4261e8d2c4a6f0b395716d4e8a2c5f7b901"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReservationsConfig {
    /// A hold that is never started is auto-cancelled after this many hours
    pub hold_expiry_hours: i64,
    /// QR tokens older than this are rejected at the gate
    pub token_ttl_hours: i64,
    /// How often the expiry and warning sweeps run
    pub sweep_interval_minutes: u64,
    /// Warning is emitted when a hold enters its final hours before expiry
    pub warning_lead_hours: i64,
    /// Cancelling inside this window after creation is always free
    pub grace_period_minutes: i64,
}

impl Default for ReservationsConfig {
    fn default() -> Self {
        Self {
            hold_expiry_hours: 24,
            token_ttl_hours: 24,
            sweep_interval_minutes: 30,
            warning_lead_hours: 1,
            grace_period_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter (overridden by `RUST_LOG`)
    pub level: String,
    /// `plain` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        toml::from_str(&raw).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
    }
}

/// Default config file location: `~/.config/parking-service/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parking-service")
        .join("config.toml")
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_missing_sections_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            api_port = 9999

            [reservations]
            sweep_interval_minutes = 5
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.api_port, 9999);
        assert_eq!(cfg.server.api_host, "0.0.0.0");
        assert_eq!(cfg.reservations.sweep_interval_minutes, 5);
        assert_eq!(cfg.reservations.hold_expiry_hours, 24);
        assert_eq!(cfg.reservations.grace_period_minutes, 15);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn empty_input_yields_full_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.api_port, 8080);
        assert_eq!(cfg.reservations.token_ttl_hours, 24);
        assert!(cfg.database.url.starts_with("sqlite://"));
        assert!(cfg.security.qr_secret_hex.len() >= 32);
    }
}
