use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use federation_core::trace::TraceContext;
use federation_events::EventType;

use crate::bus::MessageBus;
use crate::error::OutboxError;
use crate::publisher::BusPublisher;
use crate::store::SeaOrmOutboxStore;

pub const DEFAULT_EVENTS_BATCH_SIZE: u64 = 50;

/// Moves outbox messages to the bus.
///
/// A run claims the oldest batch of one event type and publishes it inside a
/// single transaction. The claim commits only if every publish succeeded;
/// otherwise the transaction rolls back and the whole batch, including
/// messages already sent, is claimed again later. Consumers absorb the
/// resulting duplicates by idempotency key.
pub struct OutboxDrainer<B> {
    db: DatabaseConnection,
    store: SeaOrmOutboxStore,
    publisher: BusPublisher<B>,
    batch_size: u64,
}

impl<B: MessageBus + 'static> OutboxDrainer<B> {
    pub fn new(db: DatabaseConnection, publisher: BusPublisher<B>, batch_size: u64) -> Self {
        Self {
            db,
            store: SeaOrmOutboxStore,
            publisher,
            batch_size: batch_size.max(1),
        }
    }

    /// Claim and publish one batch of `event_type`. Returns the number of
    /// messages published.
    pub async fn drain_once(
        &self,
        ctx: TraceContext,
        event_type: EventType,
    ) -> Result<usize, OutboxError> {
        self.drain_in_transaction(event_type)
            .instrument(ctx.span("drain_outbox"))
            .await
    }

    async fn drain_in_transaction(&self, event_type: EventType) -> Result<usize, OutboxError> {
        let txn = self.db.begin().await?;
        match self.claim_and_publish(&txn, event_type).await {
            Ok(count) => {
                txn.commit().await?;
                if count > 0 {
                    tracing::info!(event_type = %event_type, count, "outbox batch published");
                }
                Ok(count)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(error = %rollback, "outbox rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn claim_and_publish(
        &self,
        txn: &DatabaseTransaction,
        event_type: EventType,
    ) -> Result<usize, OutboxError> {
        let messages = self
            .store
            .claim_oldest(txn, event_type, self.batch_size)
            .await?;
        for message in &messages {
            let event = event_type.decode(message.payload.clone())?;
            self.publisher
                .publish(&event, message.trace_id, message.id)
                .await?;
        }
        Ok(messages.len())
    }

    /// Drain `event_type` every `interval` until `cancel` fires.
    ///
    /// Cancellation is observed between runs only; a run in progress finishes.
    pub async fn run(&self, event_type: EventType, interval: Duration, cancel: CancellationToken) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let ctx = TraceContext::new();
                    if let Err(e) = self.drain_once(ctx, event_type).await {
                        tracing::error!(
                            trace_id = %ctx.trace_id(),
                            event_type = %event_type,
                            error = %e,
                            "outbox drain failed, retrying next tick"
                        );
                    }
                }
            }
        }
        tracing::info!(event_type = %event_type, "outbox drainer stopped");
    }

    /// One periodic task per event type.
    pub fn spawn(
        self: &Arc<Self>,
        event_types: &[EventType],
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        event_types
            .iter()
            .map(|&event_type| {
                let drainer = Arc::clone(self);
                let cancel = cancel.clone();
                tokio::spawn(async move { drainer.run(event_type, interval, cancel).await })
            })
            .collect()
    }
}
