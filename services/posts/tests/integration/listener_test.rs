use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{EventType, UserId};
use federation_outbox::bus::InMemoryBus;
use federation_outbox::idempotency::InMemoryIdempotencyStore;
use federation_outbox::{
    DeliveryOutcome, EventHandler, EventListener, Envelope, MessageBus, TopicNames,
};
use federation_posts::SERVICE_NAME;
use federation_posts::domain::repository::{PostRepository, UserRepresentationRepository};
use federation_posts::listener::UserEventHandler;
use federation_testing::events::{user_created, user_deleted};

use crate::helpers::{posts_db, test_post, test_state};

#[tokio::test]
async fn should_create_representation_from_user_created_event() {
    let db = posts_db().await;
    let state = test_state(&db);
    let handler = UserEventHandler::new(state.clone());
    let user_id = Uuid::now_v7();

    let event = user_created(UserId::from(user_id));
    handler.handle(TraceContext::new(), &event).await.unwrap();
    handler.handle(TraceContext::new(), &event).await.unwrap();

    assert!(state.user_representation_repo().exists(user_id).await.unwrap());
}

#[tokio::test]
async fn should_leave_same_state_when_user_deleted_is_handled_twice() {
    let db = posts_db().await;
    let state = test_state(&db);
    let handler = UserEventHandler::new(state.clone());
    let user_id = Uuid::now_v7();
    state
        .user_representation_repo()
        .create_if_absent(user_id)
        .await
        .unwrap();
    let post = test_post(user_id);
    state
        .post_repo()
        .create(TraceContext::new(), &post)
        .await
        .unwrap();

    let event = user_deleted(UserId::from(user_id));
    handler.handle(TraceContext::new(), &event).await.unwrap();
    let once = state.post_repo().find_by_id(post.id).await.unwrap();
    handler.handle(TraceContext::new(), &event).await.unwrap();
    let twice = state.post_repo().find_by_id(post.id).await.unwrap();

    assert_eq!(once.as_ref().unwrap().user_id, None);
    assert_eq!(once, twice);
}

#[tokio::test]
async fn should_not_resurrect_user_deleted_before_created_event_arrives() {
    let db = posts_db().await;
    let state = test_state(&db);
    let handler = UserEventHandler::new(state.clone());
    let user_id = UserId::new();

    handler
        .handle(TraceContext::new(), &user_deleted(user_id))
        .await
        .unwrap();
    handler
        .handle(TraceContext::new(), &user_created(user_id))
        .await
        .unwrap();

    assert!(
        !state
            .user_representation_repo()
            .exists(user_id.into())
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn should_apply_redelivered_message_once() {
    let db = posts_db().await;
    let state = test_state(&db);
    let user_id = Uuid::now_v7();
    state
        .user_representation_repo()
        .create_if_absent(user_id)
        .await
        .unwrap();
    let post = test_post(user_id);
    state
        .post_repo()
        .create(TraceContext::new(), &post)
        .await
        .unwrap();

    let bus = InMemoryBus::new();
    let topic = TopicNames::new("federation").topic_for(EventType::UserDeleted);
    let envelope = Envelope::for_event(
        &user_deleted(UserId::from(user_id)),
        Uuid::new_v4(),
        Uuid::new_v4(),
    )
    .unwrap();
    bus.send(&topic, &envelope).await.unwrap();
    bus.send(&topic, &envelope).await.unwrap();

    let listener = EventListener::new(
        bus.consumer(&topic, SERVICE_NAME, 16),
        UserEventHandler::new(state.clone()),
        InMemoryIdempotencyStore::new(),
    );
    let outcomes = listener.poll_once().await.unwrap();

    assert_eq!(
        outcomes,
        vec![DeliveryOutcome::Applied, DeliveryOutcome::Duplicate]
    );
    assert_eq!(bus.pending(&topic, SERVICE_NAME), 0);
    let post = state.post_repo().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(post.user_id, None);
}
