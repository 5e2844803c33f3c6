//! Configuration management for the Abpack platform
//!
//! Layered loading: defaults in code, then an environment-specific file
//! (config/development.toml, config/production.toml), then ABP_-prefixed
//! environment variables on top.

use std::net::{AddrParseError, SocketAddr};

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::forecast::DepletionThresholds;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to bind the listener to.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,
    /// Access token expiration in seconds
    pub access_token_expiry: i64,
    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

/// Defaults for the consumption forecast views. Individual requests may
/// narrow or widen the window per call.
#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Trailing window for consumption aggregation, in days
    pub window_days: u32,
    /// Products at or below this many projected days are flagged urgent
    pub urgent_days: i64,
    /// Products at or below this many projected days are flagged warning
    pub warning_days: i64,
}

impl ForecastConfig {
    /// Severity thresholds for the depletion ranking.
    pub fn thresholds(&self) -> DepletionThresholds {
        DepletionThresholds {
            urgent_days: self.urgent_days,
            warning_days: self.warning_days,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ABP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("forecast.window_days", 30)?
            .set_default("forecast.urgent_days", 7)?
            .set_default("forecast.warning_days", 14)?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("ABP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
