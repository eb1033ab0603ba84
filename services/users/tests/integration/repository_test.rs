use federation_core::trace::TraceContext;
use federation_events::{EventType, UserId};
use federation_outbox::SeaOrmOutboxStore;
use federation_testing::events::{user_created, user_deleted};
use federation_users::domain::repository::UserRepository;
use federation_users::infra::db::DbUserRepository;

use crate::helpers::{test_user, users_db};

#[tokio::test]
async fn should_record_created_event_with_the_row() {
    let db = users_db().await;
    let repo = DbUserRepository::new(db.clone());
    let user = test_user("alice@example.com");
    let ctx = TraceContext::new();

    repo.create(ctx, &user).await.unwrap();

    let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.email, user.email);
    let pending = SeaOrmOutboxStore
        .pending(&db, EventType::UserCreated)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trace_id, ctx.trace_id());
    assert_eq!(
        pending[0].decode().unwrap(),
        user_created(UserId::from(user.id))
    );
}

#[tokio::test]
async fn should_emit_nothing_when_create_fails() {
    let db = users_db().await;
    let repo = DbUserRepository::new(db.clone());
    repo.create(TraceContext::new(), &test_user("alice@example.com"))
        .await
        .unwrap();

    // Same email violates the unique constraint.
    let result = repo
        .create(TraceContext::new(), &test_user("alice@example.com"))
        .await;

    assert!(result.is_err());
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn should_record_deleted_event_only_for_existing_user() {
    let db = users_db().await;
    let repo = DbUserRepository::new(db.clone());
    let user = test_user("bob@example.com");
    repo.create(TraceContext::new(), &user).await.unwrap();

    assert!(repo.delete(TraceContext::new(), user.id).await.unwrap());
    assert!(!repo.delete(TraceContext::new(), user.id).await.unwrap());

    let deleted = SeaOrmOutboxStore
        .pending(&db, EventType::UserDeleted)
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(
        deleted[0].decode().unwrap(),
        user_deleted(UserId::from(user.id))
    );
    assert_eq!(repo.find_by_id(user.id).await.unwrap(), None);
}
