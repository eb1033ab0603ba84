use sea_orm_migration::prelude::*;

use federation_comments_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
