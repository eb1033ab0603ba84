//! The domain event sum type and its wire discriminator.
//!
//! Every variant maps to exactly one [`EventType`]. The discriminator string is
//! what the outbox stores in its `type` column and what the bus carries in the
//! `x-event-type` attribute; the payload holds only the variant's fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{PostId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("unknown event type: {0}")]
    UnknownType(String),
    #[error("malformed {event_type} payload: {source}")]
    Payload {
        event_type: EventType,
        #[source]
        source: serde_json::Error,
    },
}

/// Discriminator of a [`DomainEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    UserCreated,
    UserDeleted,
    PostCreated,
    PostDeleted,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        Self::UserCreated,
        Self::UserDeleted,
        Self::PostCreated,
        Self::PostDeleted,
    ];

    pub const USER: [EventType; 2] = [Self::UserCreated, Self::UserDeleted];
    pub const POST: [EventType; 2] = [Self::PostCreated, Self::PostDeleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserCreated => "USER_EVENT_CREATED",
            Self::UserDeleted => "USER_EVENT_DELETED",
            Self::PostCreated => "POST_EVENT_CREATED",
            Self::PostDeleted => "POST_EVENT_DELETED",
        }
    }

    /// Decode a stored payload into the variant this discriminator names.
    pub fn decode(self, payload: Value) -> Result<DomainEvent, EventError> {
        let malformed = |source| EventError::Payload {
            event_type: self,
            source,
        };
        let event = match self {
            Self::UserCreated => {
                DomainEvent::User(UserEvent::Created(serde_json::from_value(payload).map_err(malformed)?))
            }
            Self::UserDeleted => {
                DomainEvent::User(UserEvent::Deleted(serde_json::from_value(payload).map_err(malformed)?))
            }
            Self::PostCreated => {
                DomainEvent::Post(PostEvent::Created(serde_json::from_value(payload).map_err(malformed)?))
            }
            Self::PostDeleted => {
                DomainEvent::Post(PostEvent::Deleted(serde_json::from_value(payload).map_err(malformed)?))
            }
        };
        Ok(event)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EventError::UnknownType(s.to_owned()))
    }
}

// ── Payloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    pub id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDeleted {
    pub id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreated {
    pub id: PostId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDeleted {
    pub id: PostId,
}

// ── Events ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEvent {
    Created(UserCreated),
    Deleted(UserDeleted),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostEvent {
    Created(PostCreated),
    Deleted(PostDeleted),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainEvent {
    User(UserEvent),
    Post(PostEvent),
}

impl DomainEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::User(UserEvent::Created(_)) => EventType::UserCreated,
            Self::User(UserEvent::Deleted(_)) => EventType::UserDeleted,
            Self::Post(PostEvent::Created(_)) => EventType::PostCreated,
            Self::Post(PostEvent::Deleted(_)) => EventType::PostDeleted,
        }
    }

    /// JSON payload without the discriminator.
    pub fn to_payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::User(UserEvent::Created(e)) => serde_json::to_value(e),
            Self::User(UserEvent::Deleted(e)) => serde_json::to_value(e),
            Self::Post(PostEvent::Created(e)) => serde_json::to_value(e),
            Self::Post(PostEvent::Deleted(e)) => serde_json::to_value(e),
        }
    }
}

impl From<UserEvent> for DomainEvent {
    fn from(event: UserEvent) -> Self {
        Self::User(event)
    }
}

impl From<PostEvent> for DomainEvent {
    fn from(event: PostEvent) -> Self {
        Self::Post(event)
    }
}
