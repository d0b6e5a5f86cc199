//! Tracking snapshots returned by carrier adapters

use crate::shipment::ShipmentStatus;
use serde::{Deserialize, Serialize};

/// One event in a carrier's tracking history, already mapped to the
/// canonical vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub timestamp: chrono::DateTime<chrono::Utc>,

    pub status: ShipmentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub description: String,
}

/// Point-in-time view of a shipment as the carrier reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    /// Current canonical status
    pub status: ShipmentStatus,

    /// Event history, oldest first
    pub events: Vec<TrackingEvent>,

    /// Carrier-native payload kept opaque for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}
