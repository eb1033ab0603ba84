use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{DomainEvent, EventType, PostId, UserEvent, UserId};
use federation_outbox::bus::{EVENT_TYPE_KEY, Envelope, InMemoryBus, MessageBus};
use federation_outbox::idempotency::InMemoryIdempotencyStore;
use federation_outbox::message::NewOutboxMessage;
use federation_outbox::{
    DeliveryOutcome, EventHandler, EventListener, SeaOrmOutboxStore, TopicNames,
};
use federation_testing::db::outbox_db;
use federation_testing::events::user_deleted;

use crate::helpers::{PREFIX, drainer, seed};

/// Post ownership as the posts service would hold it.
#[derive(Clone, Default)]
struct PostOwnership {
    owners: Arc<Mutex<HashMap<PostId, Option<UserId>>>>,
    handled: Arc<Mutex<u32>>,
}

impl EventHandler for PostOwnership {
    type Error = String;

    async fn handle(&self, _ctx: TraceContext, event: &DomainEvent) -> Result<(), String> {
        *self.handled.lock().unwrap() += 1;
        if let DomainEvent::User(UserEvent::Deleted(deleted)) = event {
            for owner in self.owners.lock().unwrap().values_mut() {
                if *owner == Some(deleted.id) {
                    *owner = None;
                }
            }
        }
        Ok(())
    }
}

#[tokio::test]
async fn should_absorb_republished_message_without_corrupting_state() {
    let db = outbox_db().await;
    let user_id = UserId::new();
    let post_id = PostId::new();
    let seeded = seed(&db, TraceContext::new(), &[user_deleted(user_id)]).await;

    let bus = InMemoryBus::new();
    let drainer = drainer(&db, bus.clone(), 3, 50);
    drainer
        .drain_once(TraceContext::new(), EventType::UserDeleted)
        .await
        .unwrap();

    // A rolled-back run after a successful send restores the row; the next
    // run sends it again with the same id.
    SeaOrmOutboxStore
        .insert(
            &db,
            NewOutboxMessage {
                id: Some(seeded[0].id),
                event_type: EventType::UserDeleted,
                payload: seeded[0].payload.clone(),
                trace_id: seeded[0].trace_id,
            },
        )
        .await
        .unwrap();
    drainer
        .drain_once(TraceContext::new(), EventType::UserDeleted)
        .await
        .unwrap();

    let topic = TopicNames::new(PREFIX).topic_for(EventType::UserDeleted);
    assert_eq!(bus.published(&topic).len(), 2);

    let posts = PostOwnership::default();
    posts.owners.lock().unwrap().insert(post_id, Some(user_id));
    let listener = EventListener::new(
        bus.consumer(&topic, "posts", 16),
        posts.clone(),
        InMemoryIdempotencyStore::new(),
    );

    let outcomes = listener.poll_once().await.unwrap();

    assert_eq!(
        outcomes,
        vec![DeliveryOutcome::Applied, DeliveryOutcome::Duplicate]
    );
    assert_eq!(*posts.handled.lock().unwrap(), 1);
    assert_eq!(posts.owners.lock().unwrap()[&post_id], None);
    assert_eq!(bus.pending(&topic, "posts"), 0);
}

#[tokio::test]
async fn should_apply_new_events_while_undecodable_ones_stay_pending() {
    let bus = InMemoryBus::new();
    let topic = TopicNames::new(PREFIX).topic_for(EventType::UserDeleted);
    let undecodable = Envelope {
        body: serde_json::json!({ "unexpected": true }),
        attributes: BTreeMap::from([(
            EVENT_TYPE_KEY.to_owned(),
            "USER_EVENT_DELETED".to_owned(),
        )]),
    };
    bus.send(&topic, &undecodable).await.unwrap();
    bus.send(&topic, &undecodable).await.unwrap();

    let posts = PostOwnership::default();
    let listener = EventListener::new(
        bus.consumer(&topic, "posts", 2),
        posts.clone(),
        InMemoryIdempotencyStore::new(),
    );
    assert_eq!(
        listener.poll_once().await.unwrap(),
        vec![DeliveryOutcome::Failed, DeliveryOutcome::Failed]
    );

    let valid = Envelope::for_event(&user_deleted(UserId::new()), Uuid::new_v4(), Uuid::new_v4())
        .unwrap();
    bus.send(&topic, &valid).await.unwrap();
    for _ in 0..3 {
        listener.poll_once().await.unwrap();
    }

    assert_eq!(*posts.handled.lock().unwrap(), 1);
    assert_eq!(bus.pending(&topic, "posts"), 2);
}
