//! Carrier registry
//!
//! Static, configured set of adapters plus their physical capability limits.
//! The registry is the single source of eligibility and of the priority
//! order used for tie-breaking; the engine never hardcodes carrier names.

use crate::adapter::CarrierAdapter;
use crate::error::RegistryError;
use freight_types::{CarrierId, CarrierProfile, PackageSpec};
use std::sync::Arc;

/// One registered carrier: capability profile plus its adapter
#[derive(Clone)]
pub struct CarrierEntry {
    pub profile: CarrierProfile,
    pub adapter: Arc<dyn CarrierAdapter>,
}

/// Registry of configured carriers, ordered by priority rank
pub struct CarrierRegistry {
    // Sorted by (priority, id) at construction; iteration order is the
    // tie-break order everywhere.
    entries: Vec<CarrierEntry>,
}

impl CarrierRegistry {
    /// Build a registry. Fails on duplicate carrier ids.
    pub fn new(mut entries: Vec<CarrierEntry>) -> Result<Self, RegistryError> {
        entries.sort_by(|a, b| {
            (a.profile.priority, a.profile.id.as_str())
                .cmp(&(b.profile.priority, b.profile.id.as_str()))
        });
        for pair in entries.windows(2) {
            if pair[0].profile.id == pair[1].profile.id {
                return Err(RegistryError::DuplicateCarrier(pair[0].profile.id.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Carriers physically able to handle the package, in priority order.
    ///
    /// An empty result is not an error by itself; the caller decides.
    pub fn eligible(&self, spec: &PackageSpec) -> Vec<CarrierProfile> {
        self.entries
            .iter()
            .filter(|e| e.profile.can_handle(spec))
            .map(|e| e.profile.clone())
            .collect()
    }

    /// All registered profiles, in priority order
    pub fn profiles(&self) -> Vec<CarrierProfile> {
        self.entries.iter().map(|e| e.profile.clone()).collect()
    }

    pub fn adapter(&self, id: &CarrierId) -> Result<Arc<dyn CarrierAdapter>, RegistryError> {
        self.entries
            .iter()
            .find(|e| &e.profile.id == id)
            .map(|e| e.adapter.clone())
            .ok_or_else(|| RegistryError::UnknownCarrier(id.clone()))
    }

    pub fn profile(&self, id: &CarrierId) -> Result<CarrierProfile, RegistryError> {
        self.entries
            .iter()
            .find(|e| &e.profile.id == id)
            .map(|e| e.profile.clone())
            .ok_or_else(|| RegistryError::UnknownCarrier(id.clone()))
    }

    /// Tie-break rank of a carrier: its position in priority order
    pub fn rank_of(&self, id: &CarrierId) -> Option<usize> {
        self.entries.iter().position(|e| &e.profile.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::BookingConfirmation;
    use crate::error::CarrierResult;
    use async_trait::async_trait;
    use freight_types::{Quote, Route, TrackingNumber, TrackingSnapshot};

    struct NullAdapter(CarrierId);

    #[async_trait]
    impl CarrierAdapter for NullAdapter {
        fn id(&self) -> CarrierId {
            self.0.clone()
        }

        async fn quote(&self, _spec: &PackageSpec, _route: &Route) -> CarrierResult<Quote> {
            unimplemented!("registry tests never issue calls")
        }

        async fn create_shipment(
            &self,
            _spec: &PackageSpec,
            _route: &Route,
        ) -> CarrierResult<BookingConfirmation> {
            unimplemented!("registry tests never issue calls")
        }

        async fn track(&self, _tracking: &TrackingNumber) -> CarrierResult<TrackingSnapshot> {
            unimplemented!("registry tests never issue calls")
        }
    }

    fn entry(id: &str, priority: u32, max_weight: f64, max_length: f64, max_volume: f64) -> CarrierEntry {
        let carrier = CarrierId::new(id);
        CarrierEntry {
            profile: CarrierProfile {
                id: carrier.clone(),
                display_name: id.to_string(),
                max_weight_kg: max_weight,
                max_length_cm: max_length,
                max_volume_m3: max_volume,
                priority,
            },
            adapter: Arc::new(NullAdapter(carrier)),
        }
    }

    fn pkg(weight: f64, length: f64, width: f64, height: f64) -> PackageSpec {
        PackageSpec {
            weight_kg: weight,
            length_cm: length,
            width_cm: width,
            height_cm: height,
            declared_value_minor: None,
            description: None,
        }
    }

    fn two_carriers() -> CarrierRegistry {
        CarrierRegistry::new(vec![
            entry("toll", 2, 50.0, 150.0, 1.0),
            entry("auspost", 1, 22.0, 105.0, 0.25),
        ])
        .unwrap()
    }

    #[test]
    fn eligible_filters_and_orders_by_priority() {
        let registry = two_carriers();

        // Small package: both are eligible, auspost (priority 1) first
        let eligible = registry.eligible(&pkg(5.0, 40.0, 30.0, 20.0));
        assert_eq!(eligible.len(), 2);
        assert_eq!(eligible[0].id.as_str(), "auspost");

        // Heavy package: only toll
        let eligible = registry.eligible(&pkg(25.0, 40.0, 30.0, 20.0));
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id.as_str(), "toll");

        // Beyond everything: empty, not an error
        let eligible = registry.eligible(&pkg(80.0, 200.0, 100.0, 100.0));
        assert!(eligible.is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = CarrierRegistry::new(vec![
            entry("auspost", 1, 22.0, 105.0, 0.25),
            entry("auspost", 2, 50.0, 150.0, 1.0),
        ]);
        assert!(matches!(result, Err(RegistryError::DuplicateCarrier(_))));
    }

    #[test]
    fn rank_follows_priority_order() {
        let registry = two_carriers();
        assert_eq!(registry.rank_of(&CarrierId::new("auspost")), Some(0));
        assert_eq!(registry.rank_of(&CarrierId::new("toll")), Some(1));
        assert_eq!(registry.rank_of(&CarrierId::new("fedex")), None);
    }
}
