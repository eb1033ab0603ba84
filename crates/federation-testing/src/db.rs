//! In-memory SQLite for repository and relay tests.
//!
//! The pool is pinned to a single connection: every SQLite `:memory:`
//! connection is its own database. A consequence is that a test holding an
//! open transaction must commit or roll it back before touching the pool again.

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityName, EntityTrait, Schema,
};

use federation_outbox::outbox_messages;

pub async fn sqlite_memory() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options)
        .await
        .expect("connect to in-memory sqlite")
}

/// Create the table backing `entity`, derived from its sea-orm definition.
pub async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) {
    let table = entity.table_name().to_owned();
    let backend = db.get_database_backend();
    let statement = Schema::new(backend).create_table_from_entity(entity);
    db.execute(backend.build(&statement))
        .await
        .unwrap_or_else(|e| panic!("create table {table}: {e}"));
}

/// In-memory database with the `outbox_messages` table.
pub async fn outbox_db() -> DatabaseConnection {
    let db = sqlite_memory().await;
    create_table(&db, outbox_messages::Entity).await;
    db
}
