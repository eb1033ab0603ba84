use axum_test::TestServer;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use federation_outbox::outbox_messages;
use federation_testing::db::{create_table, sqlite_memory};
use federation_users::domain::types::User;
use federation_users::router::build_router;
use federation_users::state::AppState;
use federation_users_schema::users;

/// In-memory database with the users and outbox tables.
pub async fn users_db() -> DatabaseConnection {
    let db = sqlite_memory().await;
    create_table(&db, users::Entity).await;
    create_table(&db, outbox_messages::Entity).await;
    db
}

pub fn test_server(db: &DatabaseConnection) -> TestServer {
    TestServer::new(build_router(AppState { db: db.clone() })).unwrap()
}

pub fn test_user(email: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::now_v7(),
        name: "alice".into(),
        email: email.into(),
        created_at: now,
        updated_at: now,
    }
}
