//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{CarrierIntegration, DaemonConfig};
use crate::error::{DaemonError, DaemonResult};
use freight_carriers::auspost::{AusPostAdapter, AusPostCredentials};
use freight_carriers::toll::{TollAdapter, TollCredentials};
use freight_carriers::{CarrierAdapter, CarrierEntry, CarrierRegistry};
use freight_engine::{
    InMemoryShipmentStore, LabelService, QuoteAggregator, ShipmentStore, TrackingPoller,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Freight daemon server
pub struct Server {
    config: DaemonConfig,
    store: Arc<dyn ShipmentStore>,
    registry: Arc<CarrierRegistry>,
    labels: Arc<LabelService>,
    poller: Arc<TrackingPoller>,
}

impl Server {
    /// Wire up store, carrier registry and engine services from configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let store: Arc<dyn ShipmentStore> = Arc::new(InMemoryShipmentStore::new());
        let registry = Arc::new(build_registry(&config)?);

        let aggregator = QuoteAggregator::new(
            registry.clone(),
            Duration::from_secs(config.quoting.call_timeout_secs),
        );
        let labels = Arc::new(LabelService::new(
            registry.clone(),
            store.clone(),
            aggregator,
            config.booking.policy(),
        ));
        let poller = TrackingPoller::new(
            registry.clone(),
            store.clone(),
            Duration::from_secs(config.tracking.call_timeout_secs),
        );

        Ok(Self {
            config,
            store,
            registry,
            labels,
            poller,
        })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(
            self.store.clone(),
            self.labels.clone(),
            self.poller.clone(),
            self.registry.clone(),
        );
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!(
            carriers = self.registry.len(),
            "Freight daemon listening on {}",
            addr
        );

        // Background tracking sweep
        let poller = self.poller.clone();
        let poll_interval = Duration::from_secs(self.config.tracking.poll_interval_secs);
        tokio::spawn(async move {
            poller.run(poll_interval).await;
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Freight daemon shutting down");

        self.poller.stop().await;

        Ok(())
    }
}

/// Construct the adapter for each configured carrier and register it
fn build_registry(config: &DaemonConfig) -> DaemonResult<CarrierRegistry> {
    let mut entries = Vec::with_capacity(config.carriers.len());
    for carrier in &config.carriers {
        let adapter: Arc<dyn CarrierAdapter> = match &carrier.integration {
            CarrierIntegration::Auspost {
                api_key,
                account_number,
                base_url,
            } => Arc::new(AusPostAdapter::new(AusPostCredentials {
                api_key: api_key.clone(),
                account_number: account_number.clone(),
                base_url: base_url.clone(),
            })),
            CarrierIntegration::Toll { api_key, base_url } => {
                Arc::new(TollAdapter::new(TollCredentials {
                    api_key: api_key.clone(),
                    base_url: base_url.clone(),
                }))
            }
        };
        entries.push(CarrierEntry {
            profile: carrier.profile(),
            adapter,
        });
    }
    CarrierRegistry::new(entries).map_err(|e| DaemonError::Config(e.to_string()))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
