//! Service Module
//!
//! Job engine for the server: admission, execution, progress, activity log
//! and the agent connection. Handlers only talk to these types.

pub mod connection;
pub mod log_sink;
pub mod progress;
pub mod registry;
pub mod runner;

// Re-export for convenience
pub use connection::{ConnectionError, ConnectionStore};
pub use log_sink::{BoundedLogSink, LogSink};
pub use progress::ProgressTracker;
pub use registry::{JobHandle, JobRegistry, RegistryError};
pub use runner::{JobRunner, RunnerSettings, SingleOpError};
