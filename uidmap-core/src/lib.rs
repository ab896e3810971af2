//! uidmap Core
//!
//! Core types for the uidmap bulk mapping console.
//!
//! This crate contains:
//! - Domain types: work items, jobs and their snapshots, log entries, the agent connection
//! - DTOs: request and response bodies of the HTTP API, including bulk item generation

pub mod domain;
pub mod dto;
pub mod error;
