use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{LockBehavior, LockType},
};
use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{DomainEvent, EventType};

use crate::error::OutboxError;
use crate::message::{NewOutboxMessage, OutboxMessage};
use crate::outbox_messages::{self, Column};

/// Outbox persistence over any sea-orm connection.
///
/// Every method takes the connection explicitly. Producers pass the
/// transaction of the mutation they are recording; the drainer passes its own
/// claiming transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmOutboxStore;

impl SeaOrmOutboxStore {
    /// Record `event` inside the caller's transaction, stamped with the
    /// caller's trace id.
    #[tracing::instrument(
        skip_all,
        fields(trace_id = %ctx.trace_id(), event_type = %event.event_type())
    )]
    pub async fn append<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: TraceContext,
        event: &DomainEvent,
    ) -> Result<OutboxMessage, OutboxError> {
        let message = self
            .insert(
                db,
                NewOutboxMessage {
                    id: None,
                    event_type: event.event_type(),
                    payload: event.to_payload()?,
                    trace_id: ctx.trace_id(),
                },
            )
            .await?;
        tracing::debug!(message_id = %message.id, seq = message.seq, "outbox message appended");
        Ok(message)
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        db: &C,
        message: NewOutboxMessage,
    ) -> Result<OutboxMessage, OutboxError> {
        let model = outbox_messages::ActiveModel {
            id: Set(message.id.unwrap_or_else(Uuid::new_v4)),
            message_type: Set(message.event_type.as_str().to_owned()),
            payload: Set(message.payload),
            trace_id: Set(message.trace_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(model.into())
    }

    /// Claim up to `limit` of the oldest messages of `event_type`.
    ///
    /// The rows are locked (`FOR UPDATE SKIP LOCKED` where the backend supports
    /// it) and deleted before returning, so they are gone once `db` commits and
    /// come back untouched if it rolls back. Returned in `(created_at, seq)`
    /// order.
    pub async fn claim_oldest<C: ConnectionTrait>(
        &self,
        db: &C,
        event_type: EventType,
        limit: u64,
    ) -> Result<Vec<OutboxMessage>, OutboxError> {
        let rows = outbox_messages::Entity::find()
            .filter(Column::MessageType.eq(event_type.as_str()))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Seq)
            .limit(limit)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(db)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let seqs: Vec<i64> = rows.iter().map(|r| r.seq).collect();
        let removed = outbox_messages::Entity::delete_many()
            .filter(Column::Seq.is_in(seqs))
            .exec(db)
            .await?
            .rows_affected;
        if removed != rows.len() as u64 {
            return Err(OutboxError::ClaimMismatch {
                claimed: rows.len(),
                removed,
            });
        }

        Ok(rows.into_iter().map(OutboxMessage::from).collect())
    }

    /// Unclaimed messages of `event_type` in claim order, without locking.
    pub async fn pending<C: ConnectionTrait>(
        &self,
        db: &C,
        event_type: EventType,
    ) -> Result<Vec<OutboxMessage>, OutboxError> {
        let rows = outbox_messages::Entity::find()
            .filter(Column::MessageType.eq(event_type.as_str()))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Seq)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(OutboxMessage::from).collect())
    }

    /// Total number of unclaimed messages across all types.
    pub async fn count<C: ConnectionTrait>(&self, db: &C) -> Result<u64, OutboxError> {
        Ok(outbox_messages::Entity::find().count(db).await?)
    }
}
