//! Environment-driven configuration for the API process.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use vitalscan_bridge::BridgeConfig;
use vitalscan_broker::DEFAULT_QUEUE;

/// API process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub redis_url: String,
    pub queue: String,
    pub data_dir: PathBuf,
    pub bridge: BridgeConfig,
    pub simulator_delay: Duration,
}

impl ApiConfig {
    /// Read configuration from the environment, defaulting anything unset.
    ///
    /// Unparseable numeric values fall back to their defaults with a warning
    /// rather than aborting startup.
    pub fn from_env() -> Self {
        let bind = env_or("VITALSCAN_BIND", "0.0.0.0:8080");
        let redis_url = env_or("REDIS_URL", "redis://127.0.0.1:6379");
        let queue = env_or("VITALSCAN_QUEUE", DEFAULT_QUEUE);
        let data_dir = PathBuf::from(env_or("VITALSCAN_DATA_DIR", "data/jobs"));

        let mut bridge = BridgeConfig::default();
        if let Ok(cmd) = std::env::var("VITALSCAN_BRIDGE_CMD") {
            bridge.command = PathBuf::from(cmd);
        }
        bridge.timeout = Duration::from_secs(env_parsed(
            "VITALSCAN_BRIDGE_TIMEOUT_SECS",
            bridge.timeout.as_secs(),
        ));

        let simulator_delay = Duration::from_millis(env_parsed("VITALSCAN_SIM_DELAY_MS", 2000));

        Self {
            bind,
            redis_url,
            queue,
            data_dir,
            bridge,
            simulator_delay,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{key}={raw} is not a valid value, using default");
            default
        }),
        Err(_) => default,
    }
}
