use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use federation_core::trace::TraceContext;
use federation_events::DomainEvent;

use crate::bus::{BusConsumer, BusError, Delivery};
use crate::idempotency::IdempotencyStore;

/// Applies one delivered event to the consuming service.
///
/// Implementations must be idempotent: "nothing left to do" is success.
pub trait EventHandler: Send + Sync {
    type Error: std::fmt::Display + Send;

    fn handle(
        &self,
        ctx: TraceContext,
        event: &DomainEvent,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// What happened to a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handler ran and the delivery was acknowledged.
    Applied,
    /// Idempotency key already seen; acknowledged without running the handler.
    Duplicate,
    /// Left unacknowledged for the bus to redeliver.
    Failed,
}

/// Pulls deliveries from one topic and feeds them to a handler.
pub struct EventListener<C, H, I> {
    consumer: C,
    handler: H,
    idempotency: I,
    idle_backoff: Duration,
}

impl<C, H, I> EventListener<C, H, I>
where
    C: BusConsumer,
    H: EventHandler,
    I: IdempotencyStore,
{
    pub fn new(consumer: C, handler: H, idempotency: I) -> Self {
        Self {
            consumer,
            handler,
            idempotency,
            idle_backoff: Duration::from_millis(500),
        }
    }

    /// Pause after a poll that made no progress.
    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    /// Receive one batch and process it in order.
    pub async fn poll_once(&self) -> Result<Vec<DeliveryOutcome>, BusError> {
        let deliveries = self.consumer.receive().await?;
        let mut outcomes = Vec::with_capacity(deliveries.len());
        for delivery in &deliveries {
            outcomes.push(self.process(delivery).await);
        }
        Ok(outcomes)
    }

    pub async fn process(&self, delivery: &Delivery) -> DeliveryOutcome {
        let ctx = TraceContext::from_attribute(delivery.envelope.trace_id());
        self.process_in_context(ctx, delivery)
            .instrument(ctx.span("consume_event"))
            .await
    }

    async fn process_in_context(&self, ctx: TraceContext, delivery: &Delivery) -> DeliveryOutcome {
        let topic = self.consumer.topic();
        let event = match delivery.envelope.decode() {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(topic, delivery_id = %delivery.id, error = %e, "undecodable delivery");
                return DeliveryOutcome::Failed;
            }
        };
        let key = delivery.envelope.idempotency_key();

        if let Some(key) = key {
            match self.idempotency.contains(key).await {
                Ok(true) => {
                    tracing::debug!(topic, idempotency_key = key, "duplicate delivery skipped");
                    return self.acknowledge(delivery, DeliveryOutcome::Duplicate).await;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(topic, error = %e, "idempotency lookup failed");
                    return DeliveryOutcome::Failed;
                }
            }
        } else {
            tracing::warn!(topic, delivery_id = %delivery.id, "delivery without idempotency key");
        }

        if let Err(e) = self.handler.handle(ctx, &event).await {
            tracing::error!(
                topic,
                event_type = %event.event_type(),
                error = %e,
                "event handler failed, leaving delivery for redelivery"
            );
            return DeliveryOutcome::Failed;
        }

        if let Some(key) = key {
            // The effect is applied; a lost key only costs one idempotent re-run.
            if let Err(e) = self.idempotency.remember(key).await {
                tracing::warn!(topic, idempotency_key = key, error = %e, "failed to record idempotency key");
            }
        }
        self.acknowledge(delivery, DeliveryOutcome::Applied).await
    }

    async fn acknowledge(&self, delivery: &Delivery, outcome: DeliveryOutcome) -> DeliveryOutcome {
        match self.consumer.ack(delivery).await {
            Ok(()) => outcome,
            Err(e) => {
                tracing::error!(
                    topic = self.consumer.topic(),
                    delivery_id = %delivery.id,
                    error = %e,
                    "ack failed"
                );
                DeliveryOutcome::Failed
            }
        }
    }

    /// Poll until `cancel` fires. A delivery interrupted by cancellation stays
    /// unacknowledged and comes back on the next start.
    pub async fn run(self, cancel: CancellationToken) {
        let topic = self.consumer.topic().to_owned();
        tracing::info!(topic = %topic, "event listener started");
        loop {
            let idle = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.poll_once() => match polled {
                    Ok(outcomes) => outcomes.iter().all(|o| *o == DeliveryOutcome::Failed),
                    Err(e) => {
                        tracing::warn!(topic = %topic, error = %e, "receive failed");
                        true
                    }
                },
            };
            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.idle_backoff) => {}
                }
            }
        }
        tracing::info!(topic = %topic, "event listener stopped");
    }
}
