use sea_orm_migration::prelude::*;

use federation_posts_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
