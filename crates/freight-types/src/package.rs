//! Package dimensions and addressing
//!
//! A `PackageSpec` is supplied per shipment request and copied onto the
//! `Shipment` once booked, so the record always shows the dimensions the
//! routing decision was made against.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Physical description of a package.
///
/// Weight in kilograms, linear dimensions in centimetres. Volume is derived,
/// in cubic metres, matching the units carriers publish their limits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Weight in kilograms
    pub weight_kg: f64,

    /// Length in centimetres (longest side)
    pub length_cm: f64,

    /// Width in centimetres
    pub width_cm: f64,

    /// Height in centimetres
    pub height_cm: f64,

    /// Declared value in minor currency units (cents), for insurance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_value_minor: Option<i64>,

    /// Free-text contents description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PackageSpec {
    /// Derived volume in cubic metres
    pub fn volume_m3(&self) -> f64 {
        (self.length_cm * self.width_cm * self.height_cm) / 1_000_000.0
    }

    /// Validate that the dimensions describe a physically shippable package
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err(ValidationError::Dimension {
                field: "weight_kg",
                value: self.weight_kg,
            });
        }
        for (field, value) in [
            ("length_cm", self.length_cm),
            ("width_cm", self.width_cm),
            ("height_cm", self.height_cm),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ValidationError::Dimension { field, value });
            }
        }
        if let Some(value) = self.declared_value_minor {
            if value < 0 {
                return Err(ValidationError::DeclaredValue(value));
            }
        }
        Ok(())
    }

    /// Collapse several item specs into one bounding spec.
    ///
    /// Weight sums; each linear dimension takes the per-item maximum, so a
    /// carrier eligible for the bound is eligible for every item.
    pub fn bounding(items: &[PackageSpec]) -> Result<PackageSpec, ValidationError> {
        let first = items.first().ok_or(ValidationError::NoItems)?;
        let mut bound = first.clone();
        for item in &items[1..] {
            bound.weight_kg += item.weight_kg;
            bound.length_cm = bound.length_cm.max(item.length_cm);
            bound.width_cm = bound.width_cm.max(item.width_cm);
            bound.height_cm = bound.height_cm.max(item.height_cm);
            bound.declared_value_minor = match (bound.declared_value_minor, item.declared_value_minor)
            {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
        }
        bound.validate()?;
        Ok(bound)
    }
}

/// A postal address for one end of a shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,

    /// Street lines, in order
    pub lines: Vec<String>,

    pub suburb: String,

    pub state: String,

    pub postcode: String,

    #[serde(default = "Address::default_country")]
    pub country: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Address {
    fn default_country() -> String {
        "AU".to_string()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.postcode.trim().is_empty() {
            return Err(ValidationError::MissingPostcode);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(())
    }
}

/// Sender and recipient pair for a shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub sender: Address,
    pub recipient: Address,
}

impl Route {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.sender.validate()?;
        self.recipient.validate()
    }
}

/// Malformed dimensions or addresses. Fails fast, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid {field}: {value}")]
    Dimension { field: &'static str, value: f64 },

    #[error("negative declared value: {0}")]
    DeclaredValue(i64),

    #[error("shipment request contains no items")]
    NoItems,

    #[error("address is missing a postcode")]
    MissingPostcode,

    #[error("address is missing a name")]
    MissingName,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(weight: f64, l: f64, w: f64, h: f64) -> PackageSpec {
        PackageSpec {
            weight_kg: weight,
            length_cm: l,
            width_cm: w,
            height_cm: h,
            declared_value_minor: None,
            description: None,
        }
    }

    #[test]
    fn volume_is_cubic_metres() {
        // 100cm x 50cm x 40cm = 0.2 m^3
        let s = spec(20.0, 100.0, 50.0, 40.0);
        assert!((s.volume_m3() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(spec(0.0, 10.0, 10.0, 10.0).validate().is_err());
        assert!(spec(1.0, -3.0, 10.0, 10.0).validate().is_err());
        assert!(spec(1.0, 10.0, 10.0, 10.0).validate().is_ok());
    }

    #[test]
    fn bounding_sums_weight_and_takes_max_dimensions() {
        let bound = PackageSpec::bounding(&[spec(2.0, 30.0, 20.0, 10.0), spec(3.0, 10.0, 40.0, 5.0)])
            .unwrap();
        assert!((bound.weight_kg - 5.0).abs() < 1e-9);
        assert!((bound.length_cm - 30.0).abs() < 1e-9);
        assert!((bound.width_cm - 40.0).abs() < 1e-9);
        assert!((bound.height_cm - 10.0).abs() < 1e-9);
    }

    #[test]
    fn bounding_rejects_empty_item_list() {
        assert_eq!(PackageSpec::bounding(&[]), Err(ValidationError::NoItems));
    }
}
