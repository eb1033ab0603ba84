use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use federation_events::{DomainEvent, EventType};

use crate::error::OutboxError;
use crate::outbox_messages;

/// A persisted outbox row, as handed to the publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    /// Store-assigned insertion order, used to break `created_at` ties.
    pub seq: i64,
    /// Stable message id. Doubles as the consumer-side idempotency key.
    pub id: Uuid,
    pub message_type: String,
    pub payload: Value,
    pub trace_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl OutboxMessage {
    pub fn event_type(&self) -> Result<EventType, OutboxError> {
        Ok(self.message_type.parse::<EventType>()?)
    }

    /// Decode the payload into the event its `type` column names.
    pub fn decode(&self) -> Result<DomainEvent, OutboxError> {
        Ok(self.event_type()?.decode(self.payload.clone())?)
    }
}

impl From<outbox_messages::Model> for OutboxMessage {
    fn from(model: outbox_messages::Model) -> Self {
        Self {
            seq: model.seq,
            id: model.id,
            message_type: model.message_type,
            payload: model.payload,
            trace_id: model.trace_id,
            created_at: model.created_at,
        }
    }
}

/// Input to [`SeaOrmOutboxStore::insert`](crate::store::SeaOrmOutboxStore::insert).
#[derive(Debug, Clone)]
pub struct NewOutboxMessage {
    /// Generated when `None`.
    pub id: Option<Uuid>,
    pub event_type: EventType,
    pub payload: Value,
    pub trace_id: Uuid,
}
