//! Consumes user events published by the users service.

use deadpool_redis::Pool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use federation_core::trace::TraceContext;
use federation_events::{DomainEvent, EventType, UserEvent};
use federation_outbox::bus::RedisStreamConsumer;
use federation_outbox::idempotency::RedisIdempotencyStore;
use federation_outbox::settings::BusSettings;
use federation_outbox::{BusError, EventHandler, EventListener, TopicNames};

use crate::SERVICE_NAME;
use crate::error::PostsServiceError;
use crate::state::AppState;
use crate::usecase::user_representation::{
    CreateUserRepresentationUseCase, DeleteUserRepresentationUseCase,
};

/// Keeps user representations in step with the users service and unlinks
/// posts of deleted users.
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
    type Error = PostsServiceError;

    async fn handle(&self, ctx: TraceContext, event: &DomainEvent) -> Result<(), PostsServiceError> {
        match event {
            DomainEvent::User(UserEvent::Created(created)) => {
                CreateUserRepresentationUseCase {
                    users: self.state.user_representation_repo(),
                }
                .execute(ctx, created.id.into())
                .await
            }
            DomainEvent::User(UserEvent::Deleted(deleted)) => {
                DeleteUserRepresentationUseCase {
                    users: self.state.user_representation_repo(),
                }
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

/// Join the `posts` consumer group on every user topic and start one
/// listener per topic.
pub async fn spawn_listeners(
    state: AppState,
    redis: Pool,
    bus: &BusSettings,
    cancel: &CancellationToken,
) -> Result<Vec<JoinHandle<()>>, BusError> {
    let topics = TopicNames::new(bus.topic_prefix.as_str());
    let mut tasks = Vec::with_capacity(EventType::USER.len());
    for event_type in EventType::USER {
        let consumer = RedisStreamConsumer::new(
            redis.clone(),
            topics.topic_for(event_type),
            SERVICE_NAME,
            bus,
        );
        consumer.ensure_group().await?;
        let listener = EventListener::new(
            consumer,
            UserEventHandler::new(state.clone()),
            RedisIdempotencyStore::new(redis.clone(), SERVICE_NAME, bus.idempotency_ttl),
        );
        tasks.push(tokio::spawn(listener.run(cancel.clone())));
    }
    Ok(tasks)
}
