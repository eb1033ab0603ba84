use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use federation_core::trace::{IDEMPOTENT_KEY, TRACING_ID_KEY, TraceContext};
use federation_events::{EventType, PostId, UserId};
use federation_outbox::bus::EVENT_TYPE_KEY;
use federation_outbox::{OutboxError, SeaOrmOutboxStore};
use federation_testing::bus::RecordingBus;
use federation_testing::db::outbox_db;
use federation_testing::events::{post_deleted, user_deleted};

use crate::helpers::{drainer, seed};

#[tokio::test]
async fn should_publish_single_post_deleted_and_empty_the_store() {
    let db = outbox_db().await;
    let ctx = TraceContext::new();
    let seeded = seed(&db, ctx, &[post_deleted(PostId::new())]).await;
    let bus = RecordingBus::new();
    let drainer = drainer(&db, bus.clone(), 3, 50);

    let published = drainer
        .drain_once(TraceContext::new(), EventType::PostDeleted)
        .await
        .unwrap();

    assert_eq!(published, 1);
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 0);

    let sent = bus.sent();
    assert_eq!(sent.len(), 1);
    let (topic, envelope) = &sent[0];
    assert_eq!(topic, "federation.post_event_deleted");
    assert_eq!(envelope.attribute(EVENT_TYPE_KEY), Some("POST_EVENT_DELETED"));
    assert_eq!(
        envelope.attribute(IDEMPOTENT_KEY),
        Some(seeded[0].id.to_string().as_str()),
        "idempotency key must be the outbox message id"
    );
    assert_eq!(
        envelope.attribute(TRACING_ID_KEY),
        Some(ctx.trace_id().to_string().as_str()),
        "trace id must come from the producing unit of work"
    );
}

#[tokio::test]
async fn should_publish_every_pending_message_in_creation_order() {
    let db = outbox_db().await;
    let events: Vec<_> = (0..3).map(|_| user_deleted(UserId::new())).collect();
    let seeded = seed(&db, TraceContext::new(), &events).await;
    let bus = RecordingBus::new();

    let published = drainer(&db, bus.clone(), 3, 50)
        .drain_once(TraceContext::new(), EventType::UserDeleted)
        .await
        .unwrap();

    assert_eq!(published, 3, "batch of 50 with 3 pending publishes exactly 3");
    assert_eq!(bus.attempts(), 3);
    let keys: Vec<String> = bus
        .sent()
        .iter()
        .map(|(_, e)| e.idempotency_key().unwrap().to_owned())
        .collect();
    let expected: Vec<String> = seeded.iter().map(|m| m.id.to_string()).collect();
    assert_eq!(keys, expected);
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn should_restore_whole_batch_when_publish_is_exhausted() {
    let db = outbox_db().await;
    let events: Vec<_> = (0..3).map(|_| user_deleted(UserId::new())).collect();
    let seeded = seed(&db, TraceContext::new(), &events).await;
    // Message 1 goes through, message 2 fails on every attempt.
    let bus = RecordingBus::failing_after(1);

    let result = drainer(&db, bus.clone(), 3, 50)
        .drain_once(TraceContext::new(), EventType::UserDeleted)
        .await;

    assert!(
        matches!(result, Err(OutboxError::PublishExhausted { attempts: 3, .. })),
        "expected PublishExhausted, got {result:?}"
    );
    assert_eq!(bus.attempts(), 1 + 3);
    let pending = SeaOrmOutboxStore
        .pending(&db, EventType::UserDeleted)
        .await
        .unwrap();
    assert_eq!(pending, seeded, "all claimed messages must be restored");
}

#[tokio::test]
async fn should_fail_fast_on_permanent_rejection() {
    let db = outbox_db().await;
    seed(&db, TraceContext::new(), &[post_deleted(PostId::new())]).await;
    let bus = RecordingBus::rejecting();

    let result = drainer(&db, bus.clone(), 5, 50)
        .drain_once(TraceContext::new(), EventType::PostDeleted)
        .await;

    assert!(
        matches!(result, Err(OutboxError::PublishRejected(_))),
        "expected PublishRejected, got {result:?}"
    );
    assert_eq!(bus.attempts(), 1);
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn should_bound_each_run_by_batch_size() {
    let db = outbox_db().await;
    let events: Vec<_> = (0..5).map(|_| post_deleted(PostId::new())).collect();
    seed(&db, TraceContext::new(), &events).await;
    let drainer = drainer(&db, RecordingBus::new(), 3, 2);

    let first = drainer
        .drain_once(TraceContext::new(), EventType::PostDeleted)
        .await
        .unwrap();
    assert_eq!(first, 2);
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 3);

    let mut total = first;
    loop {
        let n = drainer
            .drain_once(TraceContext::new(), EventType::PostDeleted)
            .await
            .unwrap();
        if n == 0 {
            break;
        }
        total += n;
    }
    assert_eq!(total, 5);
}

#[tokio::test]
async fn should_drain_periodically_until_cancelled() {
    let db = outbox_db().await;
    seed(
        &db,
        TraceContext::new(),
        &[user_deleted(UserId::new()), post_deleted(PostId::new())],
    )
    .await;
    let bus = RecordingBus::new();
    let drainer = Arc::new(drainer(&db, bus.clone(), 3, 50));
    let cancel = CancellationToken::new();

    let tasks = drainer.spawn(
        &[EventType::UserDeleted, EventType::PostDeleted],
        Duration::from_millis(10),
        &cancel,
    );
    for _ in 0..100 {
        if bus.sent().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(bus.sent().len(), 2);
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 0);
}
