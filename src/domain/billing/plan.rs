//! Premium plan terms used to sanity-check payments.

use bigdecimal::BigDecimal;

use super::{PaymentEvent, DEFAULT_BILLING_CYCLE_DAYS, DEFAULT_CURRENCY};

/// Price, currency and cycle length of the premium plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTerms {
    pub price: BigDecimal,
    pub currency: String,
    pub billing_cycle_days: i64,
}

/// Ways a paid amount can disagree with the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceDiscrepancy {
    Underpaid { expected: BigDecimal },
    CurrencyMismatch { expected: String },
}

impl PlanTerms {
    pub fn new(price: BigDecimal, currency: impl Into<String>, billing_cycle_days: i64) -> Self {
        Self {
            price,
            currency: currency.into(),
            billing_cycle_days,
        }
    }

    /// Compares a paid event against the plan. Overpayment is not a
    /// discrepancy.
    pub fn check(&self, event: &PaymentEvent) -> Option<PriceDiscrepancy> {
        if !event.currency.eq_ignore_ascii_case(&self.currency) {
            return Some(PriceDiscrepancy::CurrencyMismatch {
                expected: self.currency.clone(),
            });
        }
        if event.amount < self.price {
            return Some(PriceDiscrepancy::Underpaid {
                expected: self.price.clone(),
            });
        }
        None
    }
}

impl Default for PlanTerms {
    fn default() -> Self {
        Self::new(
            BigDecimal::from(99_000),
            DEFAULT_CURRENCY,
            DEFAULT_BILLING_CYCLE_DAYS,
        )
    }
}
