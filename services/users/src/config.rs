use federation_core::config::{or_default, required};

/// Users service configuration loaded from environment variables.
#[derive(Debug)]
pub struct UsersConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis URL for the event bus.
    pub redis_url: String,
    /// TCP port for the HTTP server (default 3121). Env var: `USERS_PORT`.
    pub users_port: u16,
}

impl UsersConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: required("DATABASE_URL"),
            redis_url: required("REDIS_URL"),
            users_port: or_default("USERS_PORT", 3121),
        }
    }
}
