//! Gateway payload normalization.
//!
//! Each gateway speaks its own status vocabulary. Normalizers map that
//! vocabulary onto [`EventKind`] and lift the fields the reconciler needs
//! into a [`PaymentEvent`]. Unmapped statuses become `EventKind::Unknown`;
//! only structurally broken payloads are errors.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::foundation::{Timestamp, ValidationError};

use super::{EventKind, Gateway, PaymentEvent};

/// Currency assumed when a gateway omits it.
pub const DEFAULT_CURRENCY: &str = "IDR";

/// Authenticated payload that cannot be turned into a [`PaymentEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl NormalizationError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        NormalizationError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ValidationError> for NormalizationError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => NormalizationError::InvalidField {
                field,
                reason: "empty".to_string(),
            },
            ValidationError::InvalidFormat { field, reason } => {
                NormalizationError::InvalidField { field, reason }
            }
        }
    }
}

/// Turns a parsed gateway payload into a canonical event.
pub trait PayloadNormalizer: Send + Sync {
    /// `received_at` is used when the payload carries no usable event time.
    fn normalize(
        &self,
        body: &serde_json::Value,
        received_at: Timestamp,
    ) -> Result<PaymentEvent, NormalizationError>;
}

/// Amounts arrive as decimal strings or bare JSON numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AmountField {
    Text(String),
    Number(serde_json::Number),
}

fn parse_amount(field: &str, raw: AmountField) -> Result<BigDecimal, NormalizationError> {
    let text = match raw {
        AmountField::Text(s) => s,
        AmountField::Number(n) => n.to_string(),
    };
    let amount = BigDecimal::from_str(text.trim())
        .map_err(|e| NormalizationError::invalid(field, e.to_string()))?;
    if amount < BigDecimal::from(0) {
        return Err(NormalizationError::invalid(field, "negative amount"));
    }
    Ok(amount)
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, NormalizationError> {
    value.ok_or(NormalizationError::MissingField(field))
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, NormalizationError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(NormalizationError::MissingField(field)),
    }
}

fn decode<'a, T: Deserialize<'a>>(body: &'a serde_json::Value) -> Result<T, NormalizationError> {
    T::deserialize(body).map_err(|e| NormalizationError::MalformedPayload(e.to_string()))
}

// ════════════════════════════════════════════════════════════════════
// GatewayA
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct GatewayAPayload {
    transaction_id: Option<String>,
    order_id: Option<String>,
    transaction_status: Option<String>,
    fraud_status: Option<String>,
    gross_amount: Option<AmountField>,
    currency: Option<String>,
    transaction_time: Option<String>,
}

/// Normalizer for GatewayA's transaction notifications.
#[derive(Debug, Clone, Copy)]
pub struct GatewayANormalizer {
    utc_offset_hours: i32,
}

impl GatewayANormalizer {
    /// `utc_offset_hours` is the zone GatewayA writes `transaction_time` in.
    pub fn new(utc_offset_hours: i32) -> Self {
        Self { utc_offset_hours }
    }

    /// Maps `transaction_status` (+ `fraud_status`) to an event kind.
    pub fn map_status(transaction_status: &str, fraud_status: Option<&str>) -> EventKind {
        match transaction_status {
            "settlement" => EventKind::Paid,
            "capture" => match fraud_status {
                None | Some("accept") => EventKind::Paid,
                Some("deny") => EventKind::PaymentFailed,
                Some(_) => EventKind::Unknown,
            },
            "deny" | "cancel" | "expire" | "failure" => EventKind::PaymentFailed,
            _ => EventKind::Unknown,
        }
    }
}

impl Default for GatewayANormalizer {
    fn default() -> Self {
        Self::new(7)
    }
}

impl PayloadNormalizer for GatewayANormalizer {
    fn normalize(
        &self,
        body: &serde_json::Value,
        received_at: Timestamp,
    ) -> Result<PaymentEvent, NormalizationError> {
        let payload: GatewayAPayload = decode(body)?;

        let transaction_id = required_text(payload.transaction_id, "transaction_id")?;
        let order_id = required_text(payload.order_id, "order_id")?;
        let status = required_text(payload.transaction_status, "transaction_status")?;
        let amount = parse_amount(
            "gross_amount",
            required(payload.gross_amount, "gross_amount")?,
        )?;

        let occurred_at = match payload.transaction_time.as_deref() {
            Some(t) if !t.is_empty() => {
                Timestamp::parse_local("transaction_time", t, self.utc_offset_hours)?
            }
            _ => received_at,
        };

        Ok(PaymentEvent {
            gateway_event_id: format!("{}:{}", transaction_id, status),
            external_reference: order_id,
            kind: Self::map_status(&status, payload.fraud_status.as_deref()),
            amount,
            currency: payload
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            occurred_at,
            gateway: Gateway::GatewayA,
        })
    }
}

// ════════════════════════════════════════════════════════════════════
// GatewayB
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct GatewayBInvoice {
    id: Option<String>,
    external_id: Option<String>,
    status: Option<String>,
    paid_amount: Option<AmountField>,
    amount: Option<AmountField>,
    currency: Option<String>,
    paid_at: Option<String>,
    updated: Option<String>,
    created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayBRecurring {
    event: String,
    id: Option<String>,
    created: Option<String>,
    data: GatewayBRecurringData,
}

#[derive(Debug, Deserialize)]
struct GatewayBRecurringData {
    reference_id: Option<String>,
    amount: Option<AmountField>,
    currency: Option<String>,
}

/// Normalizer for GatewayB's invoice callbacks and recurring envelopes.
#[derive(Debug, Default, Clone, Copy)]
pub struct GatewayBNormalizer;

impl GatewayBNormalizer {
    /// Maps an invoice `status` to an event kind.
    pub fn map_invoice_status(status: &str) -> EventKind {
        match status {
            "PAID" | "SETTLED" => EventKind::Paid,
            "EXPIRED" => EventKind::Expired,
            _ => EventKind::Unknown,
        }
    }

    /// Maps a recurring envelope `event` name to an event kind.
    pub fn map_recurring_event(event: &str) -> EventKind {
        match event {
            "recurring.cycle.succeeded" => EventKind::Paid,
            "recurring.cycle.failed" => EventKind::PaymentFailed,
            "recurring.plan.activated" => EventKind::RecurringCreated,
            _ => EventKind::Unknown,
        }
    }

    fn is_recurring(body: &serde_json::Value) -> bool {
        body.get("event").is_some_and(|e| e.is_string())
            && body.get("data").is_some_and(|d| d.is_object())
    }

    fn occurred_at(
        candidates: &[(&'static str, Option<&str>)],
        received_at: Timestamp,
    ) -> Result<Timestamp, NormalizationError> {
        for (field, value) in candidates {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                return Ok(Timestamp::parse_rfc3339(field, v)?);
            }
        }
        Ok(received_at)
    }

    fn normalize_invoice(
        body: &serde_json::Value,
        received_at: Timestamp,
    ) -> Result<PaymentEvent, NormalizationError> {
        let invoice: GatewayBInvoice = decode(body)?;

        let id = required_text(invoice.id, "id")?;
        let external_id = required_text(invoice.external_id, "external_id")?;
        let status = required_text(invoice.status, "status")?;
        let amount = match (invoice.paid_amount, invoice.amount) {
            (Some(paid), _) => parse_amount("paid_amount", paid)?,
            (None, Some(amount)) => parse_amount("amount", amount)?,
            (None, None) => return Err(NormalizationError::MissingField("amount")),
        };
        let occurred_at = Self::occurred_at(
            &[
                ("paid_at", invoice.paid_at.as_deref()),
                ("updated", invoice.updated.as_deref()),
                ("created", invoice.created.as_deref()),
            ],
            received_at,
        )?;

        Ok(PaymentEvent {
            gateway_event_id: id,
            external_reference: external_id,
            kind: Self::map_invoice_status(&status),
            amount,
            currency: invoice
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            occurred_at,
            gateway: Gateway::GatewayB,
        })
    }

    fn normalize_recurring(
        body: &serde_json::Value,
        received_at: Timestamp,
    ) -> Result<PaymentEvent, NormalizationError> {
        let envelope: GatewayBRecurring = decode(body)?;

        let id = required_text(envelope.id, "id")?;
        let reference_id = required_text(envelope.data.reference_id, "data.reference_id")?;
        let amount = parse_amount("data.amount", required(envelope.data.amount, "data.amount")?)?;
        let occurred_at =
            Self::occurred_at(&[("created", envelope.created.as_deref())], received_at)?;

        Ok(PaymentEvent {
            gateway_event_id: id,
            external_reference: reference_id,
            kind: Self::map_recurring_event(&envelope.event),
            amount,
            currency: envelope
                .data
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            occurred_at,
            gateway: Gateway::GatewayB,
        })
    }
}

impl PayloadNormalizer for GatewayBNormalizer {
    fn normalize(
        &self,
        body: &serde_json::Value,
        received_at: Timestamp,
    ) -> Result<PaymentEvent, NormalizationError> {
        if Self::is_recurring(body) {
            Self::normalize_recurring(body, received_at)
        } else {
            Self::normalize_invoice(body, received_at)
        }
    }
}
