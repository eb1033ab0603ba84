use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{EventType, PostId, UserId};
use federation_outbox::SeaOrmOutboxStore;
use federation_posts::domain::repository::{PostRepository, UserRepresentationRepository};
use federation_posts::error::PostsServiceError;
use federation_posts::state::AppState;
use federation_testing::events::{post_created, post_deleted};

use crate::helpers::{posts_db, test_post, test_state};

async fn owners(state: &AppState, ids: &[Uuid]) -> Vec<Option<Uuid>> {
    let repo = state.post_repo();
    let mut owners = Vec::with_capacity(ids.len());
    for id in ids {
        owners.push(repo.find_by_id(*id).await.unwrap().unwrap().user_id);
    }
    owners
}

#[tokio::test]
async fn should_create_user_representation_once() {
    let db = posts_db().await;
    let users = test_state(&db).user_representation_repo();
    let user_id = Uuid::now_v7();

    assert!(users.create_if_absent(user_id).await.unwrap());
    assert!(!users.create_if_absent(user_id).await.unwrap());
    assert!(users.exists(user_id).await.unwrap());
}

#[tokio::test]
async fn should_record_post_events_with_the_rows() {
    let db = posts_db().await;
    let state = test_state(&db);
    let repo = state.post_repo();
    let user_id = Uuid::now_v7();
    state
        .user_representation_repo()
        .create_if_absent(user_id)
        .await
        .unwrap();
    let post = test_post(user_id);

    repo.create(TraceContext::new(), &post).await.unwrap();
    assert!(repo.delete(TraceContext::new(), post.id).await.unwrap());
    assert!(!repo.delete(TraceContext::new(), post.id).await.unwrap());

    let created = SeaOrmOutboxStore
        .pending(&db, EventType::PostCreated)
        .await
        .unwrap();
    let deleted = SeaOrmOutboxStore
        .pending(&db, EventType::PostDeleted)
        .await
        .unwrap();
    assert_eq!(
        created[0].decode().unwrap(),
        post_created(PostId::from(post.id), UserId::from(user_id))
    );
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].decode().unwrap(), post_deleted(PostId::from(post.id)));
}

#[tokio::test]
async fn should_unlink_posts_of_deleted_user_idempotently() {
    let db = posts_db().await;
    let state = test_state(&db);
    let users = state.user_representation_repo();
    let posts = state.post_repo();
    let (deleted_user, other_user) = (Uuid::now_v7(), Uuid::now_v7());
    users.create_if_absent(deleted_user).await.unwrap();
    users.create_if_absent(other_user).await.unwrap();
    let seeded = [
        test_post(deleted_user),
        test_post(deleted_user),
        test_post(other_user),
    ];
    for post in &seeded {
        posts.create(TraceContext::new(), post).await.unwrap();
    }
    let ids: Vec<Uuid> = seeded.iter().map(|p| p.id).collect();

    let first = users.remove_and_unlink_posts(deleted_user).await.unwrap();
    let after_first = owners(&state, &ids).await;
    let second = users.remove_and_unlink_posts(deleted_user).await.unwrap();
    let after_second = owners(&state, &ids).await;

    assert_eq!(first, 2);
    assert_eq!(second, 0, "second delivery has nothing left to unlink");
    assert_eq!(after_first, vec![None, None, Some(other_user)]);
    assert_eq!(after_first, after_second);
    assert!(!users.exists(deleted_user).await.unwrap());
    assert!(users.exists(other_user).await.unwrap());
}

#[tokio::test]
async fn should_keep_user_deleted_when_creation_arrives_late() {
    let db = posts_db().await;
    let users = test_state(&db).user_representation_repo();
    let user_id = Uuid::now_v7();

    users.remove_and_unlink_posts(user_id).await.unwrap();
    assert!(!users.create_if_absent(user_id).await.unwrap());

    assert!(!users.exists(user_id).await.unwrap());
}

#[tokio::test]
async fn should_refuse_post_for_deleted_author() {
    let db = posts_db().await;
    let state = test_state(&db);
    let users = state.user_representation_repo();
    let user_id = Uuid::now_v7();
    users.create_if_absent(user_id).await.unwrap();
    users.remove_and_unlink_posts(user_id).await.unwrap();

    let result = state
        .post_repo()
        .create(TraceContext::new(), &test_post(user_id))
        .await;

    assert!(
        matches!(result, Err(PostsServiceError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 0);
}
