use federation_core::config::{or_default, required};

/// Posts service configuration loaded from environment variables.
#[derive(Debug)]
pub struct PostsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis URL for the event bus and idempotency keys.
    pub redis_url: String,
    /// TCP port for the HTTP server (default 3122). Env var: `POSTS_PORT`.
    pub posts_port: u16,
}

impl PostsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: required("DATABASE_URL"),
            redis_url: required("REDIS_URL"),
            posts_port: or_default("POSTS_PORT", 3122),
        }
    }
}
