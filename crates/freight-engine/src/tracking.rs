//! Tracking poller
//!
//! Refreshes carrier status on demand or on an interval and applies it to
//! the shipment only when the transition is forward-valid. Refreshes for a
//! single shipment are single-flighted; different shipments refresh in
//! parallel.

use crate::error::{EngineError, EngineResult};
use crate::store::{ShipmentStore, StoreError};
use freight_carriers::CarrierRegistry;
use freight_types::{Shipment, ShipmentId, TrackingEvent, TrackingNumber};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// A refreshed shipment together with the carrier's event history
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub shipment: Shipment,
    pub events: Vec<TrackingEvent>,
}

/// Polls carriers and advances shipment status monotonically
pub struct TrackingPoller {
    registry: Arc<CarrierRegistry>,
    store: Arc<dyn ShipmentStore>,
    call_timeout: Duration,
    inflight: dashmap::DashMap<ShipmentId, Arc<tokio::sync::Mutex<()>>>,
    refresh_tx: mpsc::Sender<()>,
    refresh_rx: tokio::sync::Mutex<Option<mpsc::Receiver<()>>>,
    running: Arc<RwLock<bool>>,
}

impl TrackingPoller {
    pub fn new(
        registry: Arc<CarrierRegistry>,
        store: Arc<dyn ShipmentStore>,
        call_timeout: Duration,
    ) -> Arc<Self> {
        let (refresh_tx, refresh_rx) = mpsc::channel(10);
        Arc::new(Self {
            registry,
            store,
            call_timeout,
            inflight: dashmap::DashMap::new(),
            refresh_tx,
            refresh_rx: tokio::sync::Mutex::new(Some(refresh_rx)),
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Trigger an immediate sweep from outside the poll loop
    pub async fn trigger(&self) {
        let _ = self.refresh_tx.send(()).await;
    }

    /// Refresh one shipment from its carrier.
    ///
    /// No-op (returns the persisted record and fresh events) when the
    /// carrier reports a backward or identical status; the shipment is only
    /// ever advanced.
    pub async fn refresh(&self, shipment_id: &ShipmentId) -> EngineResult<RefreshOutcome> {
        let guard = self
            .inflight
            .entry(shipment_id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let result = {
            let _lock = guard.lock().await;
            self.refresh_locked(shipment_id).await
        };
        drop(guard);
        // Evict the guard once no other refresh of this shipment holds it
        self.inflight
            .remove_if(shipment_id, |_, g| Arc::strong_count(g) == 1);
        result
    }

    async fn refresh_locked(&self, shipment_id: &ShipmentId) -> EngineResult<RefreshOutcome> {
        let shipment = self
            .store
            .get(shipment_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(shipment_id.to_string()))?;

        let Some(tracking_number) = shipment.tracking_number.clone() else {
            // Nothing to poll before a label exists
            return Ok(RefreshOutcome {
                shipment,
                events: Vec::new(),
            });
        };
        if shipment.status.is_terminal() {
            return Ok(RefreshOutcome {
                shipment,
                events: Vec::new(),
            });
        }

        let adapter = self.registry.adapter(&shipment.carrier)?;
        let snapshot =
            match tokio::time::timeout(self.call_timeout, adapter.track(&tracking_number)).await {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(err)) => return Err(EngineError::CarrierUnavailable(err)),
                Err(_) => {
                    return Err(EngineError::CarrierUnavailable(
                        freight_carriers::CarrierError::new(
                            shipment.carrier.clone(),
                            freight_carriers::CarrierErrorKind::Timeout,
                            format!("track call timed out after {}ms", self.call_timeout.as_millis()),
                        ),
                    ))
                }
            };

        let next = snapshot.status;
        let updated = self
            .apply_with_conflict_retry(shipment_id, next)
            .await?;

        Ok(RefreshOutcome {
            shipment: updated,
            events: snapshot.events,
        })
    }

    /// Refresh the shipment owning a tracking number
    pub async fn refresh_by_tracking(
        &self,
        tracking: &TrackingNumber,
    ) -> EngineResult<RefreshOutcome> {
        let shipment = self
            .store
            .find_by_tracking(tracking)
            .await?
            .ok_or_else(|| EngineError::NotFound(tracking.to_string()))?;
        self.refresh(&shipment.id).await
    }

    async fn apply_with_conflict_retry(
        &self,
        shipment_id: &ShipmentId,
        next: freight_types::ShipmentStatus,
    ) -> EngineResult<Shipment> {
        // Conflicts come from concurrent refresh/booking writers; re-reading
        // and re-applying keeps the transition check authoritative.
        for _ in 0..5 {
            let mut shipment = self
                .store
                .get(shipment_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(shipment_id.to_string()))?;

            if !shipment.apply_status(next) {
                // Backward or identical update: idempotent no-op
                tracing::debug!(
                    shipment_id = %shipment_id,
                    current = %shipment.status,
                    reported = %next,
                    "Ignoring non-forward status report"
                );
                return Ok(shipment);
            }

            match self.store.update(shipment).await {
                Ok(updated) => {
                    tracing::info!(
                        shipment_id = %shipment_id,
                        status = %updated.status,
                        "Shipment status advanced"
                    );
                    return Ok(updated);
                }
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(EngineError::Conflict(format!(
            "status update retries exhausted for shipment {}",
            shipment_id
        )))
    }

    /// Background poll loop: sweeps all trackable shipments on an interval
    /// or when triggered. Runs until `stop`.
    pub async fn run(self: Arc<Self>, poll_interval: Duration) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }
        let mut refresh_rx = match self.refresh_rx.lock().await.take() {
            Some(rx) => rx,
            None => {
                tracing::error!("Tracking poller started twice");
                return;
            }
        };

        tracing::info!(interval_secs = poll_interval.as_secs(), "Tracking poller started");
        let mut ticker = interval(poll_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                Some(_) = refresh_rx.recv() => {
                    self.sweep().await;
                }
                else => break,
            }

            let running = self.running.read().await;
            if !*running {
                break;
            }
        }

        tracing::info!("Tracking poller stopped");
    }

    /// Stop the poll loop
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// One pass over every non-terminal shipment with a tracking number.
    /// A failing carrier never aborts the sweep.
    async fn sweep(&self) {
        let shipments = match self.store.list().await {
            Ok(shipments) => shipments,
            Err(err) => {
                tracing::error!(error = %err, "Tracking sweep could not list shipments");
                return;
            }
        };

        for shipment in shipments {
            if shipment.status.is_terminal() || shipment.tracking_number.is_none() {
                continue;
            }
            if let Err(err) = self.refresh(&shipment.id).await {
                tracing::warn!(
                    shipment_id = %shipment.id,
                    error = %err,
                    "Tracking refresh failed"
                );
            }
        }
    }
}
