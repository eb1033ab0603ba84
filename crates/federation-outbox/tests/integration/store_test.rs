use sea_orm::TransactionTrait;
use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{EventType, PostId, UserId};
use federation_outbox::SeaOrmOutboxStore;
use federation_outbox::message::NewOutboxMessage;
use federation_testing::db::outbox_db;
use federation_testing::events::{post_deleted, user_created, user_deleted};

use crate::helpers::seed;

#[tokio::test]
async fn should_leave_no_trace_when_transaction_rolls_back() {
    let db = outbox_db().await;
    let store = SeaOrmOutboxStore;

    let txn = db.begin().await.unwrap();
    store
        .append(&txn, TraceContext::new(), &user_deleted(UserId::new()))
        .await
        .unwrap();
    txn.rollback().await.unwrap();

    assert_eq!(store.count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn should_stamp_trace_id_and_generate_message_id() {
    let db = outbox_db().await;
    let ctx = TraceContext::new();
    let user_id = UserId::new();

    let appended = seed(&db, ctx, &[user_created(user_id)]).await;

    let pending = SeaOrmOutboxStore
        .pending(&db, EventType::UserCreated)
        .await
        .unwrap();
    assert_eq!(pending, appended);
    assert_eq!(pending[0].trace_id, ctx.trace_id());
    assert!(!pending[0].id.is_nil());
    assert_eq!(pending[0].message_type, "USER_EVENT_CREATED");
    assert_eq!(pending[0].decode().unwrap(), user_created(user_id));
}

#[tokio::test]
async fn should_keep_explicit_message_id() {
    let db = outbox_db().await;
    let id = Uuid::new_v4();

    let message = SeaOrmOutboxStore
        .insert(
            &db,
            NewOutboxMessage {
                id: Some(id),
                event_type: EventType::PostDeleted,
                payload: serde_json::json!({ "id": PostId::new().to_string() }),
                trace_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

    assert_eq!(message.id, id);
}

#[tokio::test]
async fn should_claim_oldest_first_and_delete_claimed_rows() {
    let db = outbox_db().await;
    let store = SeaOrmOutboxStore;
    let events: Vec<_> = (0..5).map(|_| user_deleted(UserId::new())).collect();
    let seeded = seed(&db, TraceContext::new(), &events).await;

    let txn = db.begin().await.unwrap();
    let claimed = store
        .claim_oldest(&txn, EventType::UserDeleted, 3)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(claimed, seeded[..3].to_vec());
    assert!(
        claimed
            .windows(2)
            .all(|w| (w[0].created_at, w[0].seq) <= (w[1].created_at, w[1].seq)),
        "claim order must follow creation order"
    );
    let remaining = store.pending(&db, EventType::UserDeleted).await.unwrap();
    assert_eq!(remaining, seeded[3..].to_vec());
}

#[tokio::test]
async fn should_only_claim_requested_type() {
    let db = outbox_db().await;
    let store = SeaOrmOutboxStore;
    seed(
        &db,
        TraceContext::new(),
        &[
            user_deleted(UserId::new()),
            post_deleted(PostId::new()),
            user_deleted(UserId::new()),
        ],
    )
    .await;

    let txn = db.begin().await.unwrap();
    let claimed = store
        .claim_oldest(&txn, EventType::PostDeleted, 50)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].message_type, "POST_EVENT_DELETED");
    assert_eq!(store.count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn should_restore_claimed_rows_on_rollback() {
    let db = outbox_db().await;
    let store = SeaOrmOutboxStore;
    let seeded = seed(&db, TraceContext::new(), &[post_deleted(PostId::new())]).await;

    let txn = db.begin().await.unwrap();
    let claimed = store
        .claim_oldest(&txn, EventType::PostDeleted, 50)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    txn.rollback().await.unwrap();

    let pending = store.pending(&db, EventType::PostDeleted).await.unwrap();
    assert_eq!(pending, seeded);
}

#[tokio::test]
async fn should_return_empty_claim_when_nothing_pending() {
    let db = outbox_db().await;

    let txn = db.begin().await.unwrap();
    let claimed = SeaOrmOutboxStore
        .claim_oldest(&txn, EventType::UserCreated, 50)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert!(claimed.is_empty());
}
