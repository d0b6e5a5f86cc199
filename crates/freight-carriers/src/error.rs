//! Carrier and registry error types

use freight_types::CarrierId;
use thiserror::Error;

/// Classified failure from a carrier call.
///
/// The `kind` decides retry behaviour: transient kinds are retried by the
/// booking service and excluded from the current quote round; permanent
/// kinds fail immediately.
#[derive(Debug, Clone, Error)]
#[error("carrier {carrier} {kind:?}: {message}")]
pub struct CarrierError {
    pub carrier: CarrierId,
    pub kind: CarrierErrorKind,
    pub message: String,
}

impl CarrierError {
    pub fn new(carrier: CarrierId, kind: CarrierErrorKind, message: impl Into<String>) -> Self {
        Self {
            carrier,
            kind,
            message: message.into(),
        }
    }

    /// Whether retrying the same call could reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            CarrierErrorKind::Timeout | CarrierErrorKind::Transport
        )
    }
}

/// Failure classification for carrier calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierErrorKind {
    /// The call's deadline elapsed
    Timeout,

    /// Connection-level or 5xx-equivalent failure
    Transport,

    /// The carrier rejected the request (4xx-equivalent); not retried
    Rejected,

    /// The carrier does not know the referenced shipment/tracking number
    NotFound,

    /// Missing or malformed credentials/configuration
    InvalidConfig,
}

/// Registry lookup errors
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("unknown carrier: {0}")]
    UnknownCarrier(CarrierId),

    #[error("duplicate carrier registration: {0}")]
    DuplicateCarrier(CarrierId),
}

/// Result type for carrier calls
pub type CarrierResult<T> = Result<T, CarrierError>;
