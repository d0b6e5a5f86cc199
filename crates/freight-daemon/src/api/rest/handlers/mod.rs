//! API request handlers

pub mod health;
pub mod shipping;

pub use health::health_check;
pub use shipping::{create_shipment, get_shipment, track_shipment};
