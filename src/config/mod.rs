//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PAYMENT_RECONCILER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use payment_reconciler::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on port {}", config.server.port);
//! ```

mod database;
mod entitlement;
mod error;
mod gateways;
mod ledger;
mod plan;
mod server;

pub use database::DatabaseConfig;
pub use entitlement::EntitlementConfig;
pub use error::{ConfigError, ValidationError};
pub use gateways::GatewaysConfig;
pub use ledger::LedgerConfig;
pub use plan::PlanConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gateway secrets and switches
    #[serde(default)]
    pub gateways: GatewaysConfig,

    /// Premium plan terms and order reference prefix
    #[serde(default)]
    pub plan: PlanConfig,

    /// Entitlement callback
    #[serde(default)]
    pub entitlement: EntitlementConfig,

    /// Dedup ledger retention
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYMENT_RECONCILER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYMENT_RECONCILER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYMENT_RECONCILER__GATEWAYS__GATEWAY_A_SERVER_KEY=...` -> `gateways.gateway_a_server_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYMENT_RECONCILER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate(production)?;
        self.gateways.validate(production)?;
        self.plan.validate()?;
        self.entitlement.validate(production)?;
        self.ledger.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
