use sea_orm::Database;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use federation_core::tracing::init_tracing;
use federation_outbox::bus::connect_pool;
use federation_outbox::settings::{BusSettings, OutboxSettings};
use federation_users::SERVICE_NAME;
use federation_users::config::UsersConfig;
use federation_users::relay::spawn_relay;
use federation_users::router::build_router;
use federation_users::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = UsersConfig::from_env();
    let outbox = OutboxSettings::from_env();
    let bus = BusSettings::from_env(SERVICE_NAME);

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis = connect_pool(&config.redis_url, &bus).expect("failed to create Redis pool");

    let cancel = CancellationToken::new();
    let relay = spawn_relay(db.clone(), redis, &outbox, &bus, &cancel);

    let router = build_router(AppState { db });
    let http_addr = format!("0.0.0.0:{}", config.users_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("users service listening on {http_addr}");
    let shutdown = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            shutdown.cancel();
        })
        .await
        .expect("server error");

    cancel.cancel();
    for task in relay {
        if let Err(e) = task.await {
            warn!(error = %e, "relay task ended abnormally");
        }
    }
}
