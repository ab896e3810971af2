//! Configuration module
//!
//! Handles CLI configuration such as the console server URL.

use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the console server
    pub server_url: String,

    /// Interval between polls when watching a job
    pub poll_interval: Duration,
}
