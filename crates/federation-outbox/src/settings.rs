use std::time::Duration;

use federation_core::config::{millis_or, or_default, secs_or};

use crate::drainer::DEFAULT_EVENTS_BATCH_SIZE;
use crate::retry::RetryPolicy;

/// Producer-side relay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxSettings {
    /// Period of each per-type drainer task. Env var: `OUTBOX_DRAIN_INTERVAL_MS`.
    pub drain_interval: Duration,
    /// Max messages claimed per run. Env var: `OUTBOX_BATCH_SIZE`.
    pub batch_size: u64,
    /// Env vars: `OUTBOX_PUBLISH_MAX_ATTEMPTS`, `OUTBOX_PUBLISH_BACKOFF_MS`,
    /// `OUTBOX_PUBLISH_MAX_BACKOFF_MS`, `OUTBOX_PUBLISH_TIMEOUT_MS`.
    pub retry: RetryPolicy,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(5),
            batch_size: DEFAULT_EVENTS_BATCH_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

impl OutboxSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retry = RetryPolicy {
            max_attempts: or_default("OUTBOX_PUBLISH_MAX_ATTEMPTS", defaults.retry.max_attempts),
            initial_backoff: millis_or("OUTBOX_PUBLISH_BACKOFF_MS", 200),
            max_backoff: millis_or("OUTBOX_PUBLISH_MAX_BACKOFF_MS", 5_000),
            attempt_timeout: millis_or("OUTBOX_PUBLISH_TIMEOUT_MS", 3_000),
            ..defaults.retry
        };
        Self {
            drain_interval: millis_or("OUTBOX_DRAIN_INTERVAL_MS", 5_000),
            batch_size: or_default("OUTBOX_BATCH_SIZE", defaults.batch_size).max(1),
            retry,
        }
    }
}

const RESPONSE_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Consumer-side and transport settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BusSettings {
    /// Env var: `BUS_TOPIC_PREFIX` (default "federation").
    pub topic_prefix: String,
    /// Name of this instance inside its consumer group. Env var: `BUS_CONSUMER_NAME`.
    pub consumer_name: String,
    /// How long a receive blocks waiting for new entries. Env var: `BUS_READ_BLOCK_MS`.
    pub read_block: Duration,
    /// Max deliveries per receive. Env var: `BUS_READ_COUNT`.
    pub read_count: usize,
    /// Delay before unacknowledged deliveries are handed out again.
    /// Env var: `BUS_REDELIVER_AFTER_MS`.
    pub redeliver_after: Duration,
    /// Approximate cap on stream length. Env var: `BUS_STREAM_MAX_LEN`.
    pub stream_max_len: u64,
    /// Lifetime of remembered idempotency keys. Env var: `IDEMPOTENCY_TTL_SECS`.
    pub idempotency_ttl: Duration,
}

impl BusSettings {
    /// `service` names the consumer group and seeds the default consumer name.
    pub fn from_env(service: &str) -> Self {
        Self {
            topic_prefix: or_default("BUS_TOPIC_PREFIX", "federation".to_owned()),
            consumer_name: or_default("BUS_CONSUMER_NAME", format!("{service}-1")),
            read_block: millis_or("BUS_READ_BLOCK_MS", 2_000),
            read_count: or_default("BUS_READ_COUNT", 16),
            redeliver_after: millis_or("BUS_REDELIVER_AFTER_MS", 30_000),
            stream_max_len: or_default("BUS_STREAM_MAX_LEN", 100_000),
            idempotency_ttl: secs_or("IDEMPOTENCY_TTL_SECS", 86_400),
        }
    }

    /// Client-side wait for a Redis reply. Must outlast a blocking read.
    pub fn response_timeout(&self) -> Duration {
        self.read_block + RESPONSE_TIMEOUT_MARGIN
    }
}
