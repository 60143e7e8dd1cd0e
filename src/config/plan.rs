//! Premium plan configuration

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::domain::billing::{
    OrderReferenceCodec, PlanTerms, DEFAULT_BILLING_CYCLE_DAYS, DEFAULT_CURRENCY,
    DEFAULT_REFERENCE_PREFIX, REFERENCE_SEPARATOR,
};

use super::error::ValidationError;

/// Plan configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    /// Expected price, as a decimal string (e.g. `99000.00`)
    #[serde(default = "default_price")]
    pub price: String,

    /// Expected ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Length of one paid period
    #[serde(default = "default_billing_cycle_days")]
    pub billing_cycle_days: i64,

    /// Prefix of order references created at checkout
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
}

impl PlanConfig {
    /// Builds the plan terms. Call after `validate()`.
    pub fn terms(&self) -> Result<PlanTerms, ValidationError> {
        let price = BigDecimal::from_str(self.price.trim())
            .map_err(|_| ValidationError::InvalidPlanPrice)?;
        Ok(PlanTerms::new(
            price,
            self.currency.to_uppercase(),
            self.billing_cycle_days,
        ))
    }

    pub fn reference_codec(&self) -> OrderReferenceCodec {
        OrderReferenceCodec::new(self.reference_prefix.clone())
    }

    /// Validate plan configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let terms = self.terms()?;
        if terms.price <= BigDecimal::from(0) {
            return Err(ValidationError::InvalidPlanPrice);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidPlanCurrency);
        }
        if !(1..=366).contains(&self.billing_cycle_days) {
            return Err(ValidationError::InvalidBillingCycle);
        }
        if self.reference_prefix.is_empty() || self.reference_prefix.ends_with(REFERENCE_SEPARATOR)
        {
            return Err(ValidationError::InvalidReferencePrefix);
        }
        Ok(())
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            price: default_price(),
            currency: default_currency(),
            billing_cycle_days: default_billing_cycle_days(),
            reference_prefix: default_reference_prefix(),
        }
    }
}

fn default_price() -> String {
    "99000".to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_billing_cycle_days() -> i64 {
    DEFAULT_BILLING_CYCLE_DAYS
}

fn default_reference_prefix() -> String {
    DEFAULT_REFERENCE_PREFIX.to_string()
}
