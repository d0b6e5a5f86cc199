//! Shipment aggregate and lifecycle state machine
//!
//! The shipment is the only durable record this engine owns. All mutations
//! go through an optimistic version check in the store, so the `version`
//! field lives here next to the data it guards.

use crate::carrier::CarrierId;
use crate::ids::{OrderId, ShipmentId, TrackingNumber};
use crate::quote::{Quote, QuoteFailure, QuoteOutcome};
use serde::{Deserialize, Serialize};

/// Canonical shipment lifecycle state.
///
/// The happy path is strictly ordered; `Failed` and `Cancelled` are side
/// terminals reachable from any non-terminal state. Forward jumps are
/// permitted (a carrier may report a later status in one update) but a
/// transition to an earlier state is always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    Quoted,
    LabelCreated,
    Shipped,
    InTransit,
    Delivered,
    Failed,
    Cancelled,
}

impl ShipmentStatus {
    /// Position in the forward ordering. Side terminals share the top rank
    /// so nothing is "later" than them.
    fn rank(self) -> u8 {
        match self {
            ShipmentStatus::Pending => 0,
            ShipmentStatus::Quoted => 1,
            ShipmentStatus::LabelCreated => 2,
            ShipmentStatus::Shipped => 3,
            ShipmentStatus::InTransit => 4,
            ShipmentStatus::Delivered => 5,
            ShipmentStatus::Failed | ShipmentStatus::Cancelled => 6,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Failed | ShipmentStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `next` is a forward-valid transition.
    ///
    /// Identical states are not a valid transition; callers treat them as a
    /// no-op. Terminal states accept nothing.
    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        if self.is_terminal() || self == next {
            return false;
        }
        match next {
            // Side terminals are reachable from any non-terminal state
            ShipmentStatus::Failed | ShipmentStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::Quoted => "QUOTED",
            ShipmentStatus::LabelCreated => "LABEL_CREATED",
            ShipmentStatus::Shipped => "SHIPPED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Failed => "FAILED",
            ShipmentStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Machine-readable justification for the carrier choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionReason {
    /// Lowest price among several available quotes
    Cheapest,

    /// Exactly one carrier produced a usable quote
    OnlyOption,

    /// Chosen because the package exceeded every other carrier's limits
    SizeLimits,

    /// Operator override
    Forced,
}

/// Audit record of one quote considered during selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedCost {
    pub carrier: CarrierId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_minor: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<QuoteFailure>,
}

impl From<&Quote> for QuotedCost {
    fn from(quote: &Quote) -> Self {
        match &quote.outcome {
            QuoteOutcome::Priced { price_minor, .. } => QuotedCost {
                carrier: quote.carrier.clone(),
                price_minor: Some(*price_minor),
                failure: None,
            },
            QuoteOutcome::Unavailable { reason } => QuotedCost {
                carrier: quote.carrier.clone(),
                price_minor: None,
                failure: Some(reason.clone()),
            },
        }
    }
}

/// The durable shipment aggregate. One non-cancelled shipment per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,

    pub order_id: OrderId,

    /// Chosen carrier
    pub carrier: CarrierId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<TrackingNumber>,

    /// Opaque label reference (URL or carrier handle); rendering is the
    /// carrier's concern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_ref: Option<String>,

    pub status: ShipmentStatus,

    // Copy of the PackageSpec the routing decision was made against
    pub weight_kg: f64,
    pub length_cm: f64,
    pub volume_m3: f64,

    /// Price of the quote matching `carrier`, minor units
    pub shipping_cost_minor: i64,

    pub currency: String,

    /// Every quote considered, including unavailable ones
    pub quoted_costs: Vec<QuotedCost>,

    pub selected_reason: SelectionReason,

    /// Last error detail, recorded when the shipment fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Opaque carrier payload kept for audit; the engine never branches on it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_payload: Option<serde_json::Value>,

    /// Optimistic concurrency counter, incremented by the store on update
    pub version: u64,

    pub created_at: chrono::DateTime<chrono::Utc>,

    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Shipment {
    /// Apply a status transition if it is forward-valid.
    ///
    /// Returns `true` when the status changed. Backward or repeated-identical
    /// updates are no-ops and return `false`.
    pub fn apply_status(&mut self, next: ShipmentStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = chrono::Utc::now();
        true
    }

    /// Record a successful booking
    pub fn record_booking(&mut self, tracking: TrackingNumber, label_ref: Option<String>) {
        self.tracking_number = Some(tracking);
        self.label_ref = label_ref;
        self.apply_status(ShipmentStatus::LabelCreated);
    }

    /// Record a terminal booking failure with its last error
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.apply_status(ShipmentStatus::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_forward_only() {
        use ShipmentStatus::*;
        assert!(Pending.can_transition_to(Quoted));
        assert!(Quoted.can_transition_to(LabelCreated));
        assert!(LabelCreated.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Delivered));

        assert!(!Quoted.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(InTransit));
    }

    #[test]
    fn forward_jumps_are_permitted() {
        use ShipmentStatus::*;
        // Carrier may report a later status in one update
        assert!(LabelCreated.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(InTransit));
    }

    #[test]
    fn side_terminals_reachable_from_any_non_terminal() {
        use ShipmentStatus::*;
        for state in [Pending, Quoted, LabelCreated, Shipped, InTransit] {
            assert!(state.can_transition_to(Failed));
            assert!(state.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        use ShipmentStatus::*;
        for terminal in [Delivered, Failed, Cancelled] {
            for next in [
                Pending,
                Quoted,
                LabelCreated,
                Shipped,
                InTransit,
                Delivered,
                Failed,
                Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn identical_update_is_not_a_transition() {
        assert!(!ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::InTransit));
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ShipmentStatus::LabelCreated).unwrap();
        assert_eq!(json, "\"LABEL_CREATED\"");
        assert_eq!(ShipmentStatus::InTransit.to_string(), "IN_TRANSIT");
    }
}
