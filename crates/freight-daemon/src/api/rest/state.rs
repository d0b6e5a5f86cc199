//! Application state for API handlers

use freight_carriers::CarrierRegistry;
use freight_engine::{LabelService, ShipmentStore, TrackingPoller};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Shipment persistence
    pub store: Arc<dyn ShipmentStore>,

    /// Booking service (quote, select, book with retries)
    pub labels: Arc<LabelService>,

    /// Tracking refresh service
    pub poller: Arc<TrackingPoller>,

    /// Configured carriers
    pub registry: Arc<CarrierRegistry>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        store: Arc<dyn ShipmentStore>,
        labels: Arc<LabelService>,
        poller: Arc<TrackingPoller>,
        registry: Arc<CarrierRegistry>,
    ) -> Self {
        Self {
            store,
            labels,
            poller,
            registry,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
