use federation_events::{
    DomainEvent, PostCreated, PostDeleted, PostEvent, PostId, UserCreated, UserDeleted, UserEvent,
    UserId,
};

pub fn user_created(id: UserId) -> DomainEvent {
    DomainEvent::from(UserEvent::Created(UserCreated { id }))
}

pub fn user_deleted(id: UserId) -> DomainEvent {
    DomainEvent::from(UserEvent::Deleted(UserDeleted { id }))
}

pub fn post_created(id: PostId, user_id: UserId) -> DomainEvent {
    DomainEvent::from(PostEvent::Created(PostCreated { id, user_id }))
}

pub fn post_deleted(id: PostId) -> DomainEvent {
    DomainEvent::from(PostEvent::Deleted(PostDeleted { id }))
}
