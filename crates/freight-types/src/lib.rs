//! Freight Types - Core types for multi-carrier shipment routing
//!
//! The freight engine decides which carrier may legally handle a package,
//! gathers comparable quotes, deterministically selects one, and tracks the
//! resulting shipment through a bounded lifecycle.
//!
//! ## Architectural Boundaries
//!
//! - **freight-types** owns: the domain vocabulary and the shipment state
//!   machine. No I/O here.
//! - **freight-carriers** owns: the CarrierAdapter protocol and the registry
//!   of carrier capabilities.
//! - **freight-engine** owns: quote aggregation, carrier selection, booking
//!   and tracking against an injected persistence collaborator.
//!
//! ## Key Concepts
//!
//! - **PackageSpec**: physical dimensions of the thing being shipped
//! - **CarrierProfile**: a carrier's static capability limits and priority
//! - **Quote**: one carrier's priced (or explicitly unavailable) offer
//! - **Shipment**: the durable aggregate, one per order, version-guarded
//! - **Canonical status**: carrier-agnostic lifecycle state, monotonic

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod carrier;
pub mod ids;
pub mod package;
pub mod quote;
pub mod shipment;
pub mod tracking;

// Re-export main types
pub use carrier::{CarrierId, CarrierProfile};
pub use ids::{OrderId, ShipmentId, TrackingNumber};
pub use package::{Address, PackageSpec, Route, ValidationError};
pub use quote::{Quote, QuoteFailure, QuoteOutcome};
pub use shipment::{QuotedCost, SelectionReason, Shipment, ShipmentStatus};
pub use tracking::{TrackingEvent, TrackingSnapshot};
