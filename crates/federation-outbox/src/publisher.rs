use uuid::Uuid;

use federation_events::DomainEvent;

use crate::bus::{Envelope, MessageBus, TopicNames};
use crate::error::OutboxError;
use crate::retry::RetryPolicy;

/// Sends domain events to their topic with relay metadata and bounded retry.
pub struct BusPublisher<B> {
    bus: B,
    topics: TopicNames,
    retry: RetryPolicy,
}

impl<B: MessageBus> BusPublisher<B> {
    pub fn new(bus: B, topics: TopicNames, retry: RetryPolicy) -> Self {
        Self { bus, topics, retry }
    }

    /// Publish one event. `idempotency_key` is the outbox message id, so every
    /// re-publish of the same message carries the same key.
    #[tracing::instrument(
        skip_all,
        fields(event_type = %event.event_type(), message_id = %idempotency_key)
    )]
    pub async fn publish(
        &self,
        event: &DomainEvent,
        trace_id: Uuid,
        idempotency_key: Uuid,
    ) -> Result<(), OutboxError> {
        let envelope = Envelope::for_event(event, trace_id, idempotency_key)?;
        let topic = self.topics.topic_for(event.event_type());
        self.retry
            .run(|_attempt| self.bus.send(&topic, &envelope))
            .await?;
        tracing::debug!(topic = %topic, "event published");
        Ok(())
    }
}
