//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Gateway UTC offset must be between -12 and +14 hours")]
    InvalidUtcOffset,

    #[error("No payment gateway enabled")]
    NoGatewayEnabled,

    #[error("Plan price must be positive")]
    InvalidPlanPrice,

    #[error("Plan currency must be a 3-letter code")]
    InvalidPlanCurrency,

    #[error("Billing cycle must be between 1 and 366 days")]
    InvalidBillingCycle,

    #[error("Order reference prefix must be non-empty and must not end with the separator")]
    InvalidReferencePrefix,

    #[error("Entitlement callback URL must use http or https")]
    InvalidCallbackUrl,

    #[error("Entitlement callback must use HTTPS in production")]
    CallbackMustBeHttps,

    #[error("Ledger retention must be at least one day")]
    InvalidRetention,
}
