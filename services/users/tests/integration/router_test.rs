use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{EventType, UserId};
use federation_outbox::{BusPublisher, OutboxDrainer, RetryPolicy, SeaOrmOutboxStore, TopicNames};
use federation_testing::bus::RecordingBus;
use federation_testing::events::user_created;

use crate::helpers::{test_server, users_db};

#[tokio::test]
async fn should_report_health_and_readiness() {
    let db = users_db().await;
    let server = test_server(&db);

    assert_eq!(server.get("/healthz").await.status_code(), StatusCode::OK);
    assert_eq!(server.get("/readyz").await.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_create_user_and_relay_created_event() {
    let db = users_db().await;
    let server = test_server(&db);

    let response = server
        .post("/users")
        .json(&json!({ "name": "alice", "email": "alice@example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let bus = RecordingBus::new();
    let drainer = OutboxDrainer::new(
        db.clone(),
        BusPublisher::new(bus.clone(), TopicNames::new("federation"), RetryPolicy::default()),
        50,
    );
    let published = drainer
        .drain_once(TraceContext::new(), EventType::UserCreated)
        .await
        .unwrap();

    assert_eq!(published, 1);
    let sent = bus.sent();
    assert_eq!(sent[0].0, "federation.user_event_created");
    assert_eq!(sent[0].1.decode().unwrap(), user_created(UserId::from(id)));
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn should_return_conflict_for_duplicate_email() {
    let db = users_db().await;
    let server = test_server(&db);
    let body = json!({ "name": "alice", "email": "alice@example.com" });

    server.post("/users").json(&body).await;
    let response = server.post("/users").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["kind"], "USER_ALREADY_EXISTS");
    assert_eq!(SeaOrmOutboxStore.count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn should_delete_user_once() {
    let db = users_db().await;
    let server = test_server(&db);
    let created: Value = server
        .post("/users")
        .json(&json!({ "name": "bob", "email": "bob@example.com" }))
        .await
        .json();
    let path = format!("/users/{}", created["id"].as_str().unwrap());

    assert_eq!(server.get(&path).await.status_code(), StatusCode::OK);
    assert_eq!(server.delete(&path).await.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(server.delete(&path).await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(server.get(&path).await.status_code(), StatusCode::NOT_FOUND);

    let deleted = SeaOrmOutboxStore
        .pending(&db, EventType::UserDeleted)
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
}
