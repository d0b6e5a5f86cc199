//! Configuration for freightd

use freight_types::{CarrierId, CarrierProfile};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Registered carriers, in any order; priority decides tie-breaks
    #[serde(default = "default_carriers")]
    pub carriers: Vec<CarrierConfig>,

    /// Quote aggregation configuration
    #[serde(default)]
    pub quoting: QuotingConfig,

    /// Booking retry configuration
    #[serde(default)]
    pub booking: BookingConfig,

    /// Tracking poller configuration
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            carriers: default_carriers(),
            quoting: QuotingConfig::default(),
            booking: BookingConfig::default(),
            tracking: TrackingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".parse().expect("static addr"),
            enable_cors: true,
        }
    }
}

/// One carrier's capability limits, priority and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierConfig {
    pub id: String,

    pub display_name: String,

    /// Tie-break rank; lower is preferred
    pub priority: u32,

    pub max_weight_kg: f64,

    pub max_length_cm: f64,

    pub max_volume_m3: f64,

    /// Carrier integration and its credentials
    pub integration: CarrierIntegration,
}

impl CarrierConfig {
    pub fn profile(&self) -> CarrierProfile {
        CarrierProfile {
            id: CarrierId::new(&self.id),
            display_name: self.display_name.clone(),
            max_weight_kg: self.max_weight_kg,
            max_length_cm: self.max_length_cm,
            max_volume_m3: self.max_volume_m3,
            priority: self.priority,
        }
    }
}

/// Which protocol client to construct for a carrier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CarrierIntegration {
    Auspost {
        #[serde(default)]
        api_key: String,

        #[serde(default)]
        account_number: String,

        #[serde(default = "default_auspost_base_url")]
        base_url: String,
    },

    Toll {
        #[serde(default)]
        api_key: String,

        #[serde(default = "default_toll_base_url")]
        base_url: String,
    },
}

/// Quote aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotingConfig {
    /// Per-call timeout in seconds
    #[serde(default = "default_quote_timeout")]
    pub call_timeout_secs: u64,
}

impl Default for QuotingConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 5,
        }
    }
}

/// Booking retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Total attempts, including the first
    #[serde(default = "default_booking_attempts")]
    pub max_attempts: u32,

    /// Base backoff in milliseconds; doubles per retry
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_backoff_cap")]
    pub backoff_cap_ms: u64,

    /// Per-call timeout in seconds
    #[serde(default = "default_booking_timeout")]
    pub call_timeout_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 200,
            backoff_cap_ms: 5_000,
            call_timeout_secs: 10,
        }
    }
}

impl BookingConfig {
    pub fn policy(&self) -> freight_engine::BookingPolicy {
        freight_engine::BookingPolicy {
            max_attempts: self.max_attempts,
            backoff_base: std::time::Duration::from_millis(self.backoff_base_ms),
            backoff_cap: std::time::Duration::from_millis(self.backoff_cap_ms),
            call_timeout: std::time::Duration::from_secs(self.call_timeout_secs),
        }
    }
}

/// Tracking poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Sweep interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-call timeout in seconds
    #[serde(default = "default_track_timeout")]
    pub call_timeout_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            call_timeout_secs: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// The two illustrative carriers: Australia Post up to 22 kg / 105 cm /
/// 0.25 m³, Toll Priority above those limits.
fn default_carriers() -> Vec<CarrierConfig> {
    vec![
        CarrierConfig {
            id: "auspost".to_string(),
            display_name: "Australia Post".to_string(),
            priority: 1,
            max_weight_kg: 22.0,
            max_length_cm: 105.0,
            max_volume_m3: 0.25,
            integration: CarrierIntegration::Auspost {
                api_key: String::new(),
                account_number: String::new(),
                base_url: default_auspost_base_url(),
            },
        },
        CarrierConfig {
            id: "toll".to_string(),
            display_name: "Toll Priority".to_string(),
            priority: 2,
            max_weight_kg: 50.0,
            max_length_cm: 150.0,
            max_volume_m3: 1.0,
            integration: CarrierIntegration::Toll {
                api_key: String::new(),
                base_url: default_toll_base_url(),
            },
        },
    ]
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_auspost_base_url() -> String {
    freight_carriers::auspost::DEFAULT_BASE_URL.to_string()
}

fn default_toll_base_url() -> String {
    freight_carriers::toll::DEFAULT_BASE_URL.to_string()
}

fn default_quote_timeout() -> u64 {
    5
}

fn default_booking_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    200
}

fn default_backoff_cap() -> u64 {
    5_000
}

fn default_booking_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    60
}

fn default_track_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file, and the
    /// environment (`FREIGHT_` prefix)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FREIGHT")
                .separator("_")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_registers_both_carriers() {
        let config = DaemonConfig::default();
        assert_eq!(config.carriers.len(), 2);

        let auspost = &config.carriers[0];
        assert_eq!(auspost.id, "auspost");
        assert_eq!(auspost.max_weight_kg, 22.0);
        assert_eq!(auspost.max_length_cm, 105.0);
        assert_eq!(auspost.max_volume_m3, 0.25);
        assert_eq!(auspost.priority, 1);

        let toll = &config.carriers[1];
        assert_eq!(toll.id, "toll");
        assert!(toll.max_weight_kg > auspost.max_weight_kg);
    }

    #[test]
    fn timing_defaults_match_documented_policy() {
        let config = DaemonConfig::default();
        assert_eq!(config.quoting.call_timeout_secs, 5);
        assert_eq!(config.booking.max_attempts, 3);
        assert_eq!(config.tracking.poll_interval_secs, 60);
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = DaemonConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DaemonConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.carriers.len(), config.carriers.len());
        assert_eq!(back.server.listen_addr, config.server.listen_addr);
    }
}
