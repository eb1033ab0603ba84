pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod listener;
pub mod relay;
pub mod router;
pub mod state;
pub mod usecase;

/// Consumer group, idempotency namespace and default consumer-name prefix.
pub const SERVICE_NAME: &str = "posts";
