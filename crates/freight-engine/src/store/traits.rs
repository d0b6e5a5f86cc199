//! Storage trait definitions
//!
//! The store is an injected collaborator, optimistic-concurrency aware. All
//! shipment mutations go through `update`, which rejects a write whose
//! version does not match the stored record.

use async_trait::async_trait;
use freight_types::{OrderId, Shipment, ShipmentId, TrackingNumber};
use thiserror::Error;

/// Storage-specific errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("shipment not found: {0}")]
    NotFound(ShipmentId),

    #[error("shipment already exists: {0}")]
    AlreadyExists(ShipmentId),

    /// An active (non-cancelled, non-failed) shipment already exists for the
    /// order
    #[error("order already has an active shipment: {0}")]
    ActiveShipmentExists(OrderId),

    /// Optimistic version mismatch; the writer re-reads and retries
    #[error("version conflict: stored {stored}, write carried {written}")]
    VersionConflict { stored: u64, written: u64 },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence collaborator for the shipment aggregate.
///
/// Invariant enforced at this seam: at most one shipment per order that is
/// neither cancelled nor failed. Failed shipments may be superseded by a
/// fresh booking; their rows are retained for audit.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Insert a new shipment at version 0
    async fn insert(&self, shipment: Shipment) -> StoreResult<Shipment>;

    /// Atomic read-modify-write: succeeds only if `shipment.version` matches
    /// the stored version, then increments it
    async fn update(&self, shipment: Shipment) -> StoreResult<Shipment>;

    /// Get a shipment by id
    async fn get(&self, id: &ShipmentId) -> StoreResult<Option<Shipment>>;

    /// The order's current shipment: the active one if any, otherwise the
    /// most recently created
    async fn find_by_order(&self, order_id: &OrderId) -> StoreResult<Option<Shipment>>;

    /// Look a shipment up by carrier tracking number
    async fn find_by_tracking(&self, tracking: &TrackingNumber) -> StoreResult<Option<Shipment>>;

    /// All shipments, unordered
    async fn list(&self) -> StoreResult<Vec<Shipment>>;
}
