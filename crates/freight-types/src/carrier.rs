//! Carrier identity and capability profiles

use crate::package::PackageSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Carrier identifier: a string wrapper for carrier codes (e.g. "auspost",
/// "toll").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarrierId(pub String);

impl CarrierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static per-carrier capability descriptor.
///
/// Immutable; loaded at startup from configuration. `priority` orders
/// carriers for tie-breaking only; a lower rank wins ties, it never
/// overrides a cheaper quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierProfile {
    pub id: CarrierId,

    /// Human-readable name for API responses
    pub display_name: String,

    /// Maximum weight in kilograms
    pub max_weight_kg: f64,

    /// Maximum length in centimetres
    pub max_length_cm: f64,

    /// Maximum volume in cubic metres
    pub max_volume_m3: f64,

    /// Tie-break rank; lower is preferred
    pub priority: u32,
}

impl CarrierProfile {
    /// Physical eligibility: every limit must hold
    pub fn can_handle(&self, spec: &PackageSpec) -> bool {
        spec.weight_kg <= self.max_weight_kg
            && spec.length_cm <= self.max_length_cm
            && spec.volume_m3() <= self.max_volume_m3
    }
}
