//! Shipment persistence collaborator

mod memory;
mod traits;

pub use memory::InMemoryShipmentStore;
pub use traits::{ShipmentStore, StoreError, StoreResult};
