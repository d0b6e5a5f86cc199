//! freightd - Multi-carrier shipping daemon
//!
//! Exposes the freight engine over REST:
//! - POST /shipping/create books a label with the cheapest eligible carrier
//! - GET /shipping/track/{trackingNumber} refreshes and reports status
//! - Background poller advances shipment status from carrier tracking feeds

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freight_daemon::config::DaemonConfig;
use freight_daemon::error::{DaemonError, DaemonResult};
use freight_daemon::server::Server;

/// Freight daemon CLI
#[derive(Parser)]
#[command(name = "freightd")]
#[command(about = "Multi-carrier shipment routing and quoting daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FREIGHT_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "FREIGHT_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (overrides the config file)
    #[arg(long, env = "FREIGHT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FREIGHT_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        carriers = config.carriers.len(),
        "Starting freight daemon"
    );

    let server = Server::new(config)?;
    server.run().await
}
