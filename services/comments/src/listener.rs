//! Consumes user and post events and keeps local representations in step.

use deadpool_redis::Pool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use federation_core::trace::TraceContext;
use federation_events::{DomainEvent, EventType, PostEvent, UserEvent};
use federation_outbox::bus::RedisStreamConsumer;
use federation_outbox::idempotency::RedisIdempotencyStore;
use federation_outbox::settings::BusSettings;
use federation_outbox::{BusError, EventHandler, EventListener, TopicNames};

use crate::SERVICE_NAME;
use crate::error::CommentsServiceError;
use crate::state::AppState;
use crate::usecase::representation::{
    CreatePostRepresentationUseCase, CreateUserRepresentationUseCase,
    DeletePostRepresentationUseCase, DeleteUserRepresentationUseCase,
};

/// Reacts to events from the users service.
#[derive(Clone)]
pub struct UserEventHandler {
    state: AppState,
}

impl UserEventHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl EventHandler for UserEventHandler {
    type Error = CommentsServiceError;

    async fn handle(
        &self,
        ctx: TraceContext,
        event: &DomainEvent,
    ) -> Result<(), CommentsServiceError> {
        let users = self.state.user_representation_repo();
        match event {
            DomainEvent::User(UserEvent::Created(created)) => {
                CreateUserRepresentationUseCase { users }
                    .execute(ctx, created.id.into())
                    .await
            }
            DomainEvent::User(UserEvent::Deleted(deleted)) => {
                DeleteUserRepresentationUseCase { users }
                    .execute(ctx, deleted.id.into())
                    .await?;
                Ok(())
            }
            other => {
                tracing::debug!(event_type = %other.event_type(), "ignoring event");
                Ok(())
            }
        }
    }
}

/// Reacts to events from the posts service.
#[derive(Clone)]
pub struct PostEventHandler {
    state: AppState,
}

impl PostEventHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl EventHandler for PostEventHandler {
    type Error = CommentsServiceError;

    async fn handle(
        &self,
        ctx: TraceContext,
        event: &DomainEvent,
    ) -> Result<(), CommentsServiceError> {
        let posts = self.state.post_representation_repo();
        match event {
            DomainEvent::Post(PostEvent::Created(created)) => {
                CreatePostRepresentationUseCase { posts }
                    .execute(ctx, created.id.into())
                    .await
            }
            DomainEvent::Post(PostEvent::Deleted(deleted)) => {
                DeletePostRepresentationUseCase { posts }
                    .execute(ctx, deleted.id.into())
                    .await?;
                Ok(())
            }
            other => {
                tracing::debug!(event_type = %other.event_type(), "ignoring event");
                Ok(())
            }
        }
    }
}

/// Join the `comments` consumer group on every user and post topic and start
/// one listener per topic.
pub async fn spawn_listeners(
    state: AppState,
    redis: Pool,
    bus: &BusSettings,
    cancel: &CancellationToken,
) -> Result<Vec<JoinHandle<()>>, BusError> {
    let mut tasks = Vec::with_capacity(EventType::ALL.len());
    for event_type in EventType::USER {
        let handler = UserEventHandler::new(state.clone());
        tasks.push(spawn_listener(&redis, bus, event_type, handler, cancel).await?);
    }
    for event_type in EventType::POST {
        let handler = PostEventHandler::new(state.clone());
        tasks.push(spawn_listener(&redis, bus, event_type, handler, cancel).await?);
    }
    Ok(tasks)
}

async fn spawn_listener<H>(
    redis: &Pool,
    bus: &BusSettings,
    event_type: EventType,
    handler: H,
    cancel: &CancellationToken,
) -> Result<JoinHandle<()>, BusError>
where
    H: EventHandler + 'static,
{
    let topic = TopicNames::new(bus.topic_prefix.as_str()).topic_for(event_type);
    let consumer = RedisStreamConsumer::new(redis.clone(), topic, SERVICE_NAME, bus);
    consumer.ensure_group().await?;
    let listener = EventListener::new(
        consumer,
        handler,
        RedisIdempotencyStore::new(redis.clone(), SERVICE_NAME, bus.idempotency_ttl),
    );
    Ok(tokio::spawn(listener.run(cancel.clone())))
}
