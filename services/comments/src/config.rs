use federation_core::config::{or_default, required};

/// Comments service configuration loaded from environment variables.
#[derive(Debug)]
pub struct CommentsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis URL for the event bus and idempotency keys.
    pub redis_url: String,
    /// TCP port for the HTTP server (default 3123). Env var: `COMMENTS_PORT`.
    pub comments_port: u16,
}

impl CommentsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: required("DATABASE_URL"),
            redis_url: required("REDIS_URL"),
            comments_port: or_default("COMMENTS_PORT", 3123),
        }
    }
}
