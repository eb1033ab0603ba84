use axum_test::TestServer;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use federation_comments::domain::repository::{
    CommentRepository, PostRepresentationRepository, UserRepresentationRepository,
};
use federation_comments::domain::types::Comment;
use federation_comments::router::build_router;
use federation_comments::state::AppState;
use federation_comments_schema::{comments, post_representations, user_representations};
use federation_testing::db::{create_table, sqlite_memory};

/// In-memory database with the comments and representation tables.
pub async fn comments_db() -> DatabaseConnection {
    let db = sqlite_memory().await;
    create_table(&db, comments::Entity).await;
    create_table(&db, user_representations::Entity).await;
    create_table(&db, post_representations::Entity).await;
    db
}

pub fn test_state(db: &DatabaseConnection) -> AppState {
    AppState { db: db.clone() }
}

pub fn test_server(db: &DatabaseConnection) -> TestServer {
    TestServer::new(build_router(test_state(db))).unwrap()
}

/// Register `user_id` and `post_id` as known representations.
pub async fn known(state: &AppState, user_id: Uuid, post_id: Uuid) {
    state
        .user_representation_repo()
        .create_if_absent(user_id)
        .await
        .unwrap();
    state
        .post_representation_repo()
        .create_if_absent(post_id)
        .await
        .unwrap();
}

/// Whether the user representation is present and not tombstoned.
pub async fn user_is_live(state: &AppState, user_id: Uuid) -> bool {
    user_representations::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .unwrap()
        .is_some_and(|user| user.deleted_at.is_none())
}

/// Insert a comment through the repository, bypassing content validation.
pub async fn seed_comment(state: &AppState, user_id: Uuid, post_id: Uuid) -> Comment {
    let now = Utc::now();
    let comment = Comment {
        id: Uuid::now_v7(),
        user_id: Some(user_id),
        post_id,
        content: "nice post".into(),
        created_at: now,
        updated_at: now,
    };
    state.comment_repo().create(&comment).await.unwrap();
    comment
}
