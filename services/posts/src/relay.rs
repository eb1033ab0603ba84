//! Outbox relay wiring: drains post events onto the Redis Streams bus.

use std::sync::Arc;

use deadpool_redis::Pool;
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use federation_events::EventType;
use federation_outbox::bus::RedisStreamBus;
use federation_outbox::settings::{BusSettings, OutboxSettings};
use federation_outbox::{BusPublisher, OutboxDrainer, TopicNames};

/// One drainer task per post event type.
pub fn spawn_relay(
    db: DatabaseConnection,
    redis: Pool,
    outbox: &OutboxSettings,
    bus: &BusSettings,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let publisher = BusPublisher::new(
        RedisStreamBus::new(redis, bus.stream_max_len),
        TopicNames::new(bus.topic_prefix.as_str()),
        outbox.retry.clone(),
    );
    let drainer = Arc::new(OutboxDrainer::new(db, publisher, outbox.batch_size));
    drainer.spawn(&EventType::POST, outbox.drain_interval, cancel)
}
