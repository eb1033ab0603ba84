//! Transactional outbox relay.
//!
//! Producing services [`append`](store::SeaOrmOutboxStore::append) events in the
//! same database transaction as the mutation that caused them. An
//! [`OutboxDrainer`](drainer::OutboxDrainer) periodically claims the oldest
//! messages of one type, publishes them through a [`BusPublisher`](publisher::BusPublisher)
//! and commits only once every publish succeeded. On the consuming side an
//! [`EventListener`](listener::EventListener) applies each delivery at most once
//! in effect, guarded by an [`IdempotencyStore`](idempotency::IdempotencyStore).

pub mod bus;
pub mod drainer;
pub mod error;
pub mod idempotency;
pub mod listener;
pub mod message;
pub mod outbox_messages;
pub mod publisher;
pub mod retry;
pub mod settings;
pub mod store;

pub use bus::{BusConsumer, BusError, Delivery, Envelope, MessageBus, TopicNames};
pub use drainer::OutboxDrainer;
pub use error::OutboxError;
pub use listener::{DeliveryOutcome, EventHandler, EventListener};
pub use message::OutboxMessage;
pub use publisher::BusPublisher;
pub use retry::RetryPolicy;
pub use store::SeaOrmOutboxStore;
