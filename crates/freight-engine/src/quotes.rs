//! Quote aggregation
//!
//! One concurrent request per eligible carrier, each bounded by a per-call
//! timeout. A call that errors or times out yields an unavailable quote
//! rather than aborting the batch; the join is deterministic and returns
//! only once every call has settled.

use freight_carriers::CarrierRegistry;
use freight_types::{CarrierProfile, PackageSpec, Quote, QuoteFailure, Route};
use std::sync::Arc;
use std::time::Duration;

/// Fans quote requests out to eligible carriers and joins the results
pub struct QuoteAggregator {
    registry: Arc<CarrierRegistry>,
    call_timeout: Duration,
}

impl QuoteAggregator {
    pub fn new(registry: Arc<CarrierRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    /// Gather one quote per eligible carrier.
    ///
    /// Pure I/O fan-out: no persistence, no early return on first success.
    /// The result preserves the eligibility (priority) order so audit trails
    /// are deterministic.
    pub async fn gather(
        &self,
        spec: &PackageSpec,
        route: &Route,
        eligible: &[CarrierProfile],
    ) -> Vec<Quote> {
        let calls = eligible.iter().map(|profile| {
            let carrier = profile.id.clone();
            async move {
                let adapter = match self.registry.adapter(&carrier) {
                    Ok(adapter) => adapter,
                    Err(err) => {
                        // Registry drift between eligibility and dispatch
                        tracing::warn!(carrier = %carrier, error = %err, "No adapter for eligible carrier");
                        return Quote::unavailable(
                            carrier,
                            QuoteFailure::CarrierError {
                                message: err.to_string(),
                            },
                        );
                    }
                };

                match tokio::time::timeout(self.call_timeout, adapter.quote(spec, route)).await {
                    Ok(Ok(quote)) => quote,
                    Ok(Err(err)) => {
                        tracing::warn!(carrier = %carrier, error = %err, "Quote call failed");
                        Quote::unavailable(
                            carrier,
                            QuoteFailure::CarrierError {
                                message: err.to_string(),
                            },
                        )
                    }
                    Err(_) => {
                        tracing::warn!(
                            carrier = %carrier,
                            timeout_ms = self.call_timeout.as_millis() as u64,
                            "Quote call timed out"
                        );
                        Quote::unavailable(carrier, QuoteFailure::Timeout)
                    }
                }
            }
        });

        futures::future::join_all(calls).await
    }
}
