use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use federation_events::EventType;
use federation_outbox::SeaOrmOutboxStore;
use federation_posts::domain::repository::UserRepresentationRepository;

use crate::helpers::{posts_db, test_server, test_state};

#[tokio::test]
async fn should_reject_post_by_unknown_author() {
    let db = posts_db().await;
    let server = test_server(&db);

    let response = server
        .post("/posts")
        .json(&json!({ "user_id": Uuid::now_v7(), "title": "hi", "content": "body" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["kind"], "USER_NOT_FOUND");
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn should_create_list_and_delete_posts() {
    let db = posts_db().await;
    let server = test_server(&db);
    let user_id = Uuid::now_v7();
    test_state(&db)
        .user_representation_repo()
        .create_if_absent(user_id)
        .await
        .unwrap();

    let response = server
        .post("/posts")
        .json(&json!({ "user_id": user_id, "title": "hi", "content": "body" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["user_id"], user_id.to_string());
    let post_path = format!("/posts/{}", created["id"].as_str().unwrap());

    let listed: Value = server.get(&format!("/users/{user_id}/posts")).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);

    assert_eq!(
        server.delete(&post_path).await.status_code(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(server.get(&post_path).await.status_code(), StatusCode::NOT_FOUND);

    let store = SeaOrmOutboxStore;
    assert_eq!(store.pending(&db, EventType::PostCreated).await.unwrap().len(), 1);
    assert_eq!(store.pending(&db, EventType::PostDeleted).await.unwrap().len(), 1);
}

#[tokio::test]
async fn should_return_not_found_listing_posts_of_unknown_user() {
    let db = posts_db().await;
    let server = test_server(&db);

    let response = server.get(&format!("/users/{}/posts", Uuid::now_v7())).await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["kind"], "USER_NOT_FOUND");
}
