//! The CarrierAdapter protocol
//!
//! One implementation per carrier. Adapters are thin protocol clients: they
//! translate between the engine's typed vocabulary and the carrier's wire
//! format, and classify failures. They never persist anything and never
//! decide routing.

use crate::error::CarrierResult;
use async_trait::async_trait;
use freight_types::{CarrierId, PackageSpec, Quote, Route, TrackingNumber, TrackingSnapshot};
use serde::{Deserialize, Serialize};

/// Result of a successful `create_shipment` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub tracking_number: TrackingNumber,

    /// Opaque label reference (URL or carrier handle)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_ref: Option<String>,

    /// Carrier-native response kept opaque for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

/// Protocol implemented once per carrier.
///
/// Callers bound every invocation with a timeout; adapters themselves do not
/// retry; retry policy belongs to the engine.
#[async_trait]
pub trait CarrierAdapter: Send + Sync {
    /// Carrier this adapter speaks for
    fn id(&self) -> CarrierId;

    /// Obtain a priced offer for the package over the given route.
    ///
    /// An `Err` here means the call itself failed; the aggregator converts
    /// it into an unavailable `Quote` rather than aborting the batch.
    async fn quote(&self, spec: &PackageSpec, route: &Route) -> CarrierResult<Quote>;

    /// Book the shipment and obtain a tracking number and label reference
    async fn create_shipment(
        &self,
        spec: &PackageSpec,
        route: &Route,
    ) -> CarrierResult<BookingConfirmation>;

    /// Fetch the carrier's current view of a shipment, mapped onto the
    /// canonical status vocabulary
    async fn track(&self, tracking_number: &TrackingNumber) -> CarrierResult<TrackingSnapshot>;
}
