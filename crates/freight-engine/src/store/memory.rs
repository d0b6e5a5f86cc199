//! In-memory shipment store
//!
//! Suitable for development and testing. Production deployments should use a
//! persistent backend implementing the same trait.

use super::traits::{ShipmentStore, StoreError, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;
use freight_types::{OrderId, Shipment, ShipmentId, ShipmentStatus, TrackingNumber};

/// DashMap-backed store with secondary indexes by order and tracking number
pub struct InMemoryShipmentStore {
    shipments: DashMap<ShipmentId, Shipment>,
    by_order: DashMap<OrderId, Vec<ShipmentId>>,
    by_tracking: DashMap<TrackingNumber, ShipmentId>,
}

impl InMemoryShipmentStore {
    pub fn new() -> Self {
        Self {
            shipments: DashMap::new(),
            by_order: DashMap::new(),
            by_tracking: DashMap::new(),
        }
    }

    fn is_active(status: ShipmentStatus) -> bool {
        !matches!(status, ShipmentStatus::Failed | ShipmentStatus::Cancelled)
    }
}

impl Default for InMemoryShipmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    async fn insert(&self, mut shipment: Shipment) -> StoreResult<Shipment> {
        if self.shipments.contains_key(&shipment.id) {
            return Err(StoreError::AlreadyExists(shipment.id));
        }

        // At most one active shipment per order
        if let Some(ids) = self.by_order.get(&shipment.order_id) {
            for id in ids.iter() {
                if let Some(existing) = self.shipments.get(id) {
                    if Self::is_active(existing.status) {
                        return Err(StoreError::ActiveShipmentExists(shipment.order_id));
                    }
                }
            }
        }

        shipment.version = 0;
        self.by_order
            .entry(shipment.order_id.clone())
            .or_default()
            .push(shipment.id.clone());
        if let Some(tracking) = &shipment.tracking_number {
            self.by_tracking
                .insert(tracking.clone(), shipment.id.clone());
        }
        self.shipments
            .insert(shipment.id.clone(), shipment.clone());
        Ok(shipment)
    }

    async fn update(&self, mut shipment: Shipment) -> StoreResult<Shipment> {
        let mut entry = self
            .shipments
            .get_mut(&shipment.id)
            .ok_or_else(|| StoreError::NotFound(shipment.id.clone()))?;

        if entry.version != shipment.version {
            return Err(StoreError::VersionConflict {
                stored: entry.version,
                written: shipment.version,
            });
        }

        shipment.version += 1;
        if let Some(tracking) = &shipment.tracking_number {
            self.by_tracking
                .insert(tracking.clone(), shipment.id.clone());
        }
        *entry = shipment.clone();
        Ok(shipment)
    }

    async fn get(&self, id: &ShipmentId) -> StoreResult<Option<Shipment>> {
        Ok(self.shipments.get(id).map(|s| s.clone()))
    }

    async fn find_by_order(&self, order_id: &OrderId) -> StoreResult<Option<Shipment>> {
        let Some(ids) = self.by_order.get(order_id) else {
            return Ok(None);
        };

        let mut latest: Option<Shipment> = None;
        for id in ids.iter() {
            if let Some(shipment) = self.shipments.get(id) {
                if Self::is_active(shipment.status) {
                    return Ok(Some(shipment.clone()));
                }
                match &latest {
                    Some(seen) if seen.created_at >= shipment.created_at => {}
                    _ => latest = Some(shipment.clone()),
                }
            }
        }
        Ok(latest)
    }

    async fn find_by_tracking(&self, tracking: &TrackingNumber) -> StoreResult<Option<Shipment>> {
        let Some(id) = self.by_tracking.get(tracking) else {
            return Ok(None);
        };
        Ok(self.shipments.get(&id).map(|s| s.clone()))
    }

    async fn list(&self) -> StoreResult<Vec<Shipment>> {
        Ok(self.shipments.iter().map(|s| s.value().clone()).collect())
    }
}
