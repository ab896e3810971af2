//! Core domain types
//!
//! The structures shared by the server (which executes jobs) and the client
//! and CLI (which observe and drive them).

pub mod connection;
pub mod job;
pub mod log;
pub mod work_item;
