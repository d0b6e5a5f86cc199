//! Freight Engine - routing, quoting, booking and tracking
//!
//! This crate holds the decision logic of the shipment engine:
//!
//! - **QuoteAggregator**: concurrent, timeout-bounded quote fan-out with a
//!   deterministic fan-in join
//! - **CarrierSelector**: pure decision function over aggregated quotes
//! - **LabelService**: drives booking with retry/backoff and idempotency
//! - **TrackingPoller**: maps carrier status onto the monotonic state machine
//! - **ShipmentStore**: injected persistence collaborator with optimistic
//!   concurrency
//!
//! ## In-Memory vs Persistent
//!
//! The crate ships an in-memory store suitable for development and testing.
//! Production deployments should use a persistent backend implementing the
//! same trait.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod booking;
pub mod error;
pub mod quotes;
pub mod selector;
pub mod store;
pub mod tracking;

// Re-exports
pub use booking::{BookingPolicy, LabelService};
pub use error::{EngineError, EngineResult};
pub use quotes::QuoteAggregator;
pub use selector::{select, NoCarrierAvailable, Selection};
pub use store::{InMemoryShipmentStore, ShipmentStore, StoreError, StoreResult};
pub use tracking::{RefreshOutcome, TrackingPoller};
