//! Carrier quotes
//!
//! Quotes are ephemeral: produced by the aggregator, consumed by the
//! selector, and persisted on the shipment only as the `quoted_costs` audit
//! trail.

use crate::carrier::CarrierId;
use serde::{Deserialize, Serialize};

/// One carrier's answer to a quote request: either a priced offer or an
/// explicit statement of unavailability with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub carrier: CarrierId,
    pub outcome: QuoteOutcome,
}

impl Quote {
    pub fn priced(carrier: CarrierId, price_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            carrier,
            outcome: QuoteOutcome::Priced {
                price_minor,
                currency: currency.into(),
                transit_days: None,
            },
        }
    }

    pub fn unavailable(carrier: CarrierId, reason: QuoteFailure) -> Self {
        Self {
            carrier,
            outcome: QuoteOutcome::Unavailable { reason },
        }
    }

    /// Price if the quote is usable
    pub fn price_minor(&self) -> Option<i64> {
        match &self.outcome {
            QuoteOutcome::Priced { price_minor, .. } => Some(*price_minor),
            QuoteOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.outcome, QuoteOutcome::Priced { .. })
    }
}

/// Outcome of a single quote call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteOutcome {
    /// A usable priced offer
    Priced {
        /// Price in minor currency units (cents)
        price_minor: i64,

        /// ISO currency code, e.g. "AUD"
        currency: String,

        /// Estimated transit time in days, when the carrier reports one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transit_days: Option<u32>,
    },

    /// No price could be obtained. Never aborts the batch; the selector
    /// discards these.
    Unavailable { reason: QuoteFailure },
}

/// Why a quote could not be obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum QuoteFailure {
    /// The per-call deadline elapsed
    Timeout,

    /// The carrier answered with an error
    CarrierError { message: String },

    /// The carrier was asked outside its physical limits
    Ineligible,
}
