//! Server configuration
//!
//! Defines all configurable parameters for the server including the bind
//! address, agent connection settings, job pacing and log retention.

use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
///
/// All timeouts and limits are configurable to allow tuning for different
/// agents (lab vs production firewalls, fast vs slow networks).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// Agent endpoint (`host:port`) used until an operator verifies another
    pub agent_url: String,

    /// Directory holding `rootCA.crt`, `uia-client.crt` and `uia-client.key`
    pub cert_dir: PathBuf,

    /// Upper bound for a single agent round trip
    pub agent_timeout: Duration,

    /// Upper bound for the TCP stage of a connection probe
    pub probe_timeout: Duration,

    /// Number of activity log entries retained
    pub log_capacity: usize,

    /// Consecutive unreachable results after which a job fails
    pub unreachable_threshold: u32,

    /// Pause the job after this many processed items (0 disables pacing)
    pub throttle_every: usize,

    /// Length of the pacing pause
    pub throttle_pause: Duration,

    /// How long an emergency stop waits for the running job to wind down
    pub emergency_grace: Duration,

    /// Largest batch accepted in one submission
    pub max_batch: usize,
}

impl ServerConfig {
    /// Creates a new configuration with defaults
    pub fn new(bind_addr: String, agent_url: String) -> Self {
        Self {
            bind_addr,
            agent_url,
            cert_dir: PathBuf::from("certs"),
            agent_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(4),
            log_capacity: 200,
            unreachable_threshold: 3,
            throttle_every: 1000,
            throttle_pause: Duration::from_millis(2000),
            emergency_grace: Duration::from_millis(2000),
            max_batch: 100_000,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - UIDMAP_BIND_ADDR (default: 0.0.0.0:8000)
    /// - UIDMAP_AGENT_URL (default: 127.0.0.1:5006)
    /// - UIDMAP_CERT_DIR (default: certs)
    /// - UIDMAP_AGENT_TIMEOUT (seconds, default: 10)
    /// - UIDMAP_PROBE_TIMEOUT (seconds, default: 4)
    /// - UIDMAP_LOG_CAPACITY (default: 200)
    /// - UIDMAP_UNREACHABLE_THRESHOLD (default: 3)
    /// - UIDMAP_THROTTLE_EVERY (default: 1000)
    /// - UIDMAP_THROTTLE_PAUSE_MS (default: 2000)
    /// - UIDMAP_EMERGENCY_GRACE_MS (default: 2000)
    /// - UIDMAP_MAX_BATCH (default: 100000)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("UIDMAP_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let agent_url = std::env::var("UIDMAP_AGENT_URL").unwrap_or(defaults.agent_url);
        let cert_dir = std::env::var("UIDMAP_CERT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cert_dir);

        Ok(Self {
            bind_addr,
            agent_url,
            cert_dir,
            agent_timeout: env_parse("UIDMAP_AGENT_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.agent_timeout),
            probe_timeout: env_parse("UIDMAP_PROBE_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
            log_capacity: env_parse("UIDMAP_LOG_CAPACITY")?.unwrap_or(defaults.log_capacity),
            unreachable_threshold: env_parse("UIDMAP_UNREACHABLE_THRESHOLD")?
                .unwrap_or(defaults.unreachable_threshold),
            throttle_every: env_parse("UIDMAP_THROTTLE_EVERY")?.unwrap_or(defaults.throttle_every),
            throttle_pause: env_parse("UIDMAP_THROTTLE_PAUSE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.throttle_pause),
            emergency_grace: env_parse("UIDMAP_EMERGENCY_GRACE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.emergency_grace),
            max_batch: env_parse("UIDMAP_MAX_BATCH")?.unwrap_or(defaults.max_batch),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        uidmap_core::domain::connection::ConnectionConfig::parse_endpoint(&self.agent_url)
            .map_err(|e| anyhow::anyhow!("agent_url: {}", e))?;

        if self.agent_timeout.is_zero() {
            anyhow::bail!("agent_timeout must be greater than 0");
        }

        if self.probe_timeout.is_zero() {
            anyhow::bail!("probe_timeout must be greater than 0");
        }

        if self.log_capacity == 0 {
            anyhow::bail!("log_capacity must be greater than 0");
        }

        if self.unreachable_threshold == 0 {
            anyhow::bail!("unreachable_threshold must be greater than 0");
        }

        if self.max_batch == 0 {
            anyhow::bail!("max_batch must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0:8000".to_string(), "127.0.0.1:5006".to_string())
    }
}

/// Reads and parses an optional variable; a present but malformed value is an error
fn env_parse<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(None),
    }
}
