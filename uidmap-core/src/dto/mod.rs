//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies shared by the server handlers and the client.
//! Batch requests know how to expand themselves into work items.

pub mod job;
pub mod mapping;
pub mod status;
pub mod tag;
