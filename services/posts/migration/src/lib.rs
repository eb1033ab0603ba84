use sea_orm_migration::prelude::*;

mod m20260301_000001_create_user_representations;
mod m20260301_000002_create_posts;
mod m20260301_000003_create_outbox_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_user_representations::Migration),
            Box::new(m20260301_000002_create_posts::Migration),
            Box::new(m20260301_000003_create_outbox_messages::Migration),
        ]
    }
}
