//! Freight Carriers - Carrier adapters and the capability registry
//!
//! This crate provides the carrier-facing half of the routing engine:
//!
//! - **CarrierAdapter**: the protocol every carrier integration implements
//!   (`quote`, `create_shipment`, `track`)
//! - **CarrierRegistry**: configured set of adapters plus their physical
//!   capability limits, the single source of eligibility and priority order
//! - Concrete adapters for Australia Post and Toll Priority, each behind a
//!   transport trait so they are testable without a network
//!
//! Adding a carrier means writing one adapter and one registry entry; the
//! engine never branches on carrier names.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod adapter;
pub mod auspost;
pub mod error;
pub mod registry;
pub mod toll;

// Re-exports
pub use adapter::{BookingConfirmation, CarrierAdapter};
pub use auspost::{AusPostAdapter, AusPostTransport, HttpAusPostTransport};
pub use error::{CarrierError, CarrierErrorKind, RegistryError};
pub use registry::{CarrierEntry, CarrierRegistry};
pub use toll::{HttpTollTransport, TollAdapter, TollTransport};
