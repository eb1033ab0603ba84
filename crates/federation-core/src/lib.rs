//! Shared plumbing for the federation services: tracing setup, trace-context
//! propagation, health probes, request ids and env-driven configuration.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod trace;
pub mod tracing;
