//! Message bus port and its adapters.
//!
//! The relay only needs two capabilities from a bus: send an [`Envelope`] to a
//! named topic, and receive/acknowledge deliveries from a topic on behalf of a
//! consumer group. Unacknowledged deliveries must come back later.

mod envelope;
pub mod memory;
mod pending;
pub mod redis;

use federation_events::EventType;

pub use envelope::{BODY_FIELD, EVENT_TYPE_KEY, Envelope};
pub use memory::{InMemoryBus, InMemoryConsumer};
pub use pending::{PendingScan, ScanStart};
pub use redis::{RedisStreamBus, RedisStreamConsumer, connect_pool};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("bus transport error: {0}")]
    Transport(String),
    #[error("bus operation timed out")]
    Timeout,
    #[error("bus rejected message: {0}")]
    Rejected(String),
    #[error("bus connection pool error: {0}")]
    Pool(String),
    #[error("malformed bus entry: {0}")]
    Malformed(String),
}

impl BusError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout | Self::Pool(_))
    }
}

/// One received message, identified by the bus for acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub id: String,
    pub envelope: Envelope,
}

/// Producer side of the bus.
pub trait MessageBus: Send + Sync {
    fn send(
        &self,
        topic: &str,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), BusError>> + Send;
}

/// Consumer side of the bus, bound to one topic and one consumer group.
pub trait BusConsumer: Send + Sync {
    fn topic(&self) -> &str;

    /// Next batch of deliveries. May be empty.
    fn receive(&self) -> impl Future<Output = Result<Vec<Delivery>, BusError>> + Send;

    /// Mark a delivery as processed so it is never redelivered.
    fn ack(&self, delivery: &Delivery) -> impl Future<Output = Result<(), BusError>> + Send;
}

/// Maps event types to topic names: `"{prefix}.{type}"`, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNames {
    prefix: String,
}

impl TopicNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn topic_for(&self, event_type: EventType) -> String {
        format!("{}.{}", self.prefix, event_type.as_str()).to_lowercase()
    }
}
