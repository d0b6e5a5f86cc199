//! Label service
//!
//! Drives the full booking pipeline: validate, filter eligible carriers,
//! gather quotes, select, persist the decision, book with the winner.
//! Transient booking failures are retried with exponential backoff up to a
//! fixed cap; exhausted retries persist the shipment as FAILED with the last
//! error attached. Booking is idempotent per order and single-flighted so
//! two concurrent attempts can never produce two tracking numbers.

use crate::error::{EngineError, EngineResult};
use crate::quotes::QuoteAggregator;
use crate::selector;
use crate::store::{ShipmentStore, StoreError};
use freight_carriers::CarrierRegistry;
use freight_types::{
    OrderId, PackageSpec, QuotedCost, Route, Shipment, ShipmentId, ShipmentStatus,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Retry/backoff policy for booking calls
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles each retry
    pub backoff_base: Duration,

    /// Upper bound on any single delay
    pub backoff_cap: Duration,

    /// Per-call deadline for `create_shipment`
    pub call_timeout: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(200),
            backoff_cap: Duration::from_secs(5),
            call_timeout: Duration::from_secs(10),
        }
    }
}

// Bounded retries on optimistic version conflicts; conflicts are expected
// under concurrent refresh, not an error until this is exhausted.
const CONFLICT_RETRIES: u32 = 5;

/// Books shipments with the selected carrier and persists the outcome
pub struct LabelService {
    registry: Arc<CarrierRegistry>,
    store: Arc<dyn ShipmentStore>,
    aggregator: QuoteAggregator,
    policy: BookingPolicy,
    // Per-order single-flight guard
    inflight: dashmap::DashMap<OrderId, Arc<tokio::sync::Mutex<()>>>,
}

impl LabelService {
    pub fn new(
        registry: Arc<CarrierRegistry>,
        store: Arc<dyn ShipmentStore>,
        aggregator: QuoteAggregator,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            registry,
            store,
            aggregator,
            policy,
            inflight: dashmap::DashMap::new(),
        }
    }

    /// Book a shipment for an order.
    ///
    /// Idempotent: a repeat call for an order that already has a non-failed
    /// shipment returns the existing record unchanged. Callers always
    /// receive a terminal outcome: on exhausted retries the shipment is
    /// persisted as FAILED and `BookingFailed` is returned.
    pub async fn book(
        &self,
        order_id: OrderId,
        spec: PackageSpec,
        route: Route,
    ) -> EngineResult<Shipment> {
        spec.validate()?;
        route.validate()?;

        let guard = self
            .inflight
            .entry(order_id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let result = {
            let _lock = guard.lock().await;
            self.book_locked(&order_id, &spec, &route).await
        };
        drop(guard);
        // Evict the guard once no other booking for this order holds it
        self.inflight
            .remove_if(&order_id, |_, g| Arc::strong_count(g) == 1);
        result
    }

    async fn book_locked(
        &self,
        order_id: &OrderId,
        spec: &PackageSpec,
        route: &Route,
    ) -> EngineResult<Shipment> {
        // Idempotency: an existing non-failed shipment is the answer
        if let Some(existing) = self.store.find_by_order(order_id).await? {
            if existing.status != ShipmentStatus::Failed {
                tracing::debug!(
                    order_id = %order_id,
                    shipment_id = %existing.id,
                    "Returning existing shipment for order"
                );
                return Ok(existing);
            }
        }

        let eligible = self.registry.eligible(spec);
        if eligible.is_empty() {
            tracing::info!(
                order_id = %order_id,
                weight_kg = spec.weight_kg,
                length_cm = spec.length_cm,
                volume_m3 = spec.volume_m3(),
                "No carrier eligible for package"
            );
            return Err(EngineError::NoCarrierEligible);
        }

        let quotes = self.aggregator.gather(spec, route, &eligible).await;
        let priority_order: Vec<_> = eligible.iter().map(|p| p.id.clone()).collect();
        let selection =
            selector::select(&quotes, &priority_order).map_err(|_| EngineError::NoCarrierAvailable)?;

        tracing::info!(
            order_id = %order_id,
            carrier = %selection.carrier,
            price_minor = selection.price_minor,
            reason = ?selection.reason,
            "Carrier selected"
        );

        let now = chrono::Utc::now();
        let draft = Shipment {
            id: ShipmentId::generate(),
            order_id: order_id.clone(),
            carrier: selection.carrier.clone(),
            tracking_number: None,
            label_ref: None,
            status: ShipmentStatus::Quoted,
            weight_kg: spec.weight_kg,
            length_cm: spec.length_cm,
            volume_m3: spec.volume_m3(),
            shipping_cost_minor: selection.price_minor,
            currency: selection.currency.clone(),
            quoted_costs: quotes.iter().map(QuotedCost::from).collect(),
            selected_reason: selection.reason,
            last_error: None,
            carrier_payload: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let shipment = match self.store.insert(draft).await {
            Ok(shipment) => shipment,
            // Lost a race despite the guard (e.g. another process); the
            // existing record is authoritative
            Err(StoreError::ActiveShipmentExists(_)) => {
                return self
                    .store
                    .find_by_order(order_id)
                    .await?
                    .ok_or_else(|| EngineError::NotFound(order_id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        self.create_with_retries(shipment, spec, route).await
    }

    /// Attempt `create_shipment` with the chosen carrier, retrying transient
    /// failures with exponential backoff
    async fn create_with_retries(
        &self,
        shipment: Shipment,
        spec: &PackageSpec,
        route: &Route,
    ) -> EngineResult<Shipment> {
        let adapter = self.registry.adapter(&shipment.carrier)?;
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                let exp = self
                    .policy
                    .backoff_base
                    .saturating_mul(1u32 << (attempt - 2).min(16));
                let delay = exp.min(self.policy.backoff_cap);
                let jitter = rand::thread_rng().gen_range(0..=delay.as_millis() as u64 / 4);
                tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
            }

            match tokio::time::timeout(
                self.policy.call_timeout,
                adapter.create_shipment(spec, route),
            )
            .await
            {
                Ok(Ok(confirmation)) => {
                    tracing::info!(
                        shipment_id = %shipment.id,
                        carrier = %shipment.carrier,
                        tracking_number = %confirmation.tracking_number,
                        attempt,
                        "Booking confirmed"
                    );
                    return self
                        .persist(&shipment.id, move |s| {
                            s.record_booking(
                                confirmation.tracking_number.clone(),
                                confirmation.label_ref.clone(),
                            );
                            s.carrier_payload = confirmation.raw.clone();
                        })
                        .await;
                }
                Ok(Err(err)) if err.is_transient() => {
                    tracing::warn!(
                        shipment_id = %shipment.id,
                        carrier = %shipment.carrier,
                        attempt,
                        error = %err,
                        "Transient booking failure"
                    );
                    last_error = err.to_string();
                }
                Ok(Err(err)) => {
                    // Permanent rejection; no point retrying
                    tracing::error!(
                        shipment_id = %shipment.id,
                        carrier = %shipment.carrier,
                        error = %err,
                        "Booking rejected"
                    );
                    last_error = err.to_string();
                    break;
                }
                Err(_) => {
                    tracing::warn!(
                        shipment_id = %shipment.id,
                        carrier = %shipment.carrier,
                        attempt,
                        "Booking call timed out"
                    );
                    last_error = format!(
                        "booking call timed out after {}ms",
                        self.policy.call_timeout.as_millis()
                    );
                }
            }
        }

        // Terminal outcome: persist FAILED with the last error for operators
        let carrier = shipment.carrier.clone();
        let error_detail = last_error.clone();
        self.persist(&shipment.id, move |s| {
            s.record_failure(error_detail.clone());
        })
        .await?;

        Err(EngineError::BookingFailed {
            carrier,
            message: last_error,
        })
    }

    /// Optimistic read-modify-write with bounded conflict retries
    async fn persist(
        &self,
        id: &ShipmentId,
        mutate: impl Fn(&mut Shipment),
    ) -> EngineResult<Shipment> {
        for _ in 0..CONFLICT_RETRIES {
            let mut shipment = self
                .store
                .get(id)
                .await?
                .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
            mutate(&mut shipment);

            match self.store.update(shipment).await {
                Ok(updated) => return Ok(updated),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(EngineError::Conflict(format!(
            "persist retries exhausted for shipment {}",
            id
        )))
    }
}
