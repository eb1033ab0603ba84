//! Domain events exchanged between the federation services.
//!
//! Pure types only: identifiers, the event sum type and its discriminator.
//! Persistence and transport live in `federation-outbox`.

pub mod event;
pub mod id;

pub use event::{
    DomainEvent, EventError, EventType, PostCreated, PostDeleted, PostEvent, UserCreated,
    UserDeleted, UserEvent,
};
pub use id::{PostId, UserId};
