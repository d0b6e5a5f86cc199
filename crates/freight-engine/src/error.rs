//! Engine error taxonomy
//!
//! Transient carrier-local failures are absorbed and retried at the smallest
//! possible scope; decision-level failures are explicit values here so
//! callers can present a clear "cannot ship this package" outcome.

use freight_carriers::{CarrierError, RegistryError};
use freight_types::{CarrierId, ValidationError};
use thiserror::Error;

use crate::store::StoreError;

/// Engine-level errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed dimensions or addresses; fails fast, never retried
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Every carrier profile's size limits are exceeded (pre-quote failure)
    #[error("no carrier is physically able to handle this package")]
    NoCarrierEligible,

    /// All eligible carriers returned unavailable quotes
    #[error("no eligible carrier produced a usable quote")]
    NoCarrierAvailable,

    /// A carrier call timed out or failed transiently
    #[error("carrier unavailable: {0}")]
    CarrierUnavailable(#[from] CarrierError),

    /// Booking exhausted retries or hit a permanent error; the shipment is
    /// persisted as FAILED with the detail attached
    #[error("booking with {carrier} failed: {message}")]
    BookingFailed { carrier: CarrierId, message: String },

    /// Shipment not found
    #[error("shipment not found: {0}")]
    NotFound(String),

    /// Optimistic concurrency retries exhausted
    #[error("persistence conflict: {0}")]
    Conflict(String),

    /// Storage failure
    #[error("store error: {0}")]
    Store(StoreError),

    /// Registry lookup failure (configuration drift)
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { .. } => EngineError::Conflict(err.to_string()),
            other => EngineError::Store(other),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
