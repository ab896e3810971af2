//! Validation errors for batches and endpoints

use thiserror::Error;

use crate::domain::job::JobKind;

/// Reasons a batch cannot become a job
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch contains no items")]
    Empty,

    #[error("item {index} is a {found} operation, expected {expected}")]
    MixedKinds {
        index: usize,
        expected: JobKind,
        found: JobKind,
    },

    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("invalid subnet {subnet}: {reason}")]
    InvalidSubnet { subnet: String, reason: String },

    #[error("{count} addresses starting at {base} run past the end of the address space")]
    AddressOverflow { base: String, count: usize },

    #[error("item {index}: {field} must not be empty")]
    EmptyField { index: usize, field: &'static str },
}

/// Malformed `host:port` endpoint
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid endpoint {0}: use host:port")]
    MissingPort(String),

    #[error("invalid endpoint {0}: host is empty")]
    MissingHost(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),
}
