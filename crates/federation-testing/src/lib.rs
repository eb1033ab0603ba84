//! Test utilities for the federation services.
//!
//! In-memory SQLite bootstrap, recording/failing bus doubles and event
//! factories. Import from `dev-dependencies` only.

pub mod bus;
pub mod db;
pub mod events;
