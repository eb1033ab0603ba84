use federation_events::EventError;

use crate::bus::BusError;

/// Failures of the producing side of the relay.
///
/// Any of these aborts a drainer run; the claiming transaction is rolled back
/// and the batch is retried on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
    #[error("undecodable outbox payload: {0}")]
    Decode(#[source] EventError),
    #[error("claimed {claimed} outbox messages but removed {removed}")]
    ClaimMismatch { claimed: usize, removed: u64 },
    #[error("publish failed after {attempts} attempts: {source}")]
    PublishExhausted {
        attempts: u32,
        #[source]
        source: BusError,
    },
    #[error("publish rejected: {0}")]
    PublishRejected(#[source] BusError),
}

impl From<EventError> for OutboxError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::UnknownType(t) => Self::UnknownEventType(t),
            other => Self::Decode(other),
        }
    }
}
