//! Freight daemon library
//!
//! Components for the shipping daemon:
//! - REST API handlers for booking and tracking
//! - Carrier registry construction from configuration
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
