//! Agent connection domain types

use serde::{Deserialize, Serialize};

use crate::error::EndpointError;

/// The agent endpoint the console talks to
///
/// `verified` is only ever set after a successful connectivity probe (or an
/// explicit operator override).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// `host:port`
    pub endpoint: String,
    pub verified: bool,
}

impl ConnectionConfig {
    pub fn unverified(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            verified: false,
        }
    }

    pub fn verified(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            verified: true,
        }
    }

    /// Splits `host:port`, rejecting anything else
    ///
    /// IPv6 hosts must be bracketed (`[::1]:5006`).
    pub fn parse_endpoint(endpoint: &str) -> Result<(&str, u16), EndpointError> {
        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(endpoint.to_string()))?;

        if host.is_empty() {
            return Err(EndpointError::MissingHost(endpoint.to_string()));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| EndpointError::InvalidPort(port.to_string()))?;

        Ok((host, port))
    }
}
