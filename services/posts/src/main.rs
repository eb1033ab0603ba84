use sea_orm::Database;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use federation_core::tracing::init_tracing;
use federation_outbox::bus::connect_pool;
use federation_outbox::settings::{BusSettings, OutboxSettings};
use federation_posts::SERVICE_NAME;
use federation_posts::config::PostsConfig;
use federation_posts::listener::spawn_listeners;
use federation_posts::relay::spawn_relay;
use federation_posts::router::build_router;
use federation_posts::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = PostsConfig::from_env();
    let outbox = OutboxSettings::from_env();
    let bus = BusSettings::from_env(SERVICE_NAME);

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis = connect_pool(&config.redis_url, &bus).expect("failed to create Redis pool");

    let state = AppState { db };
    let cancel = CancellationToken::new();

    let mut background = spawn_relay(state.db.clone(), redis.clone(), &outbox, &bus, &cancel);
    background.extend(
        spawn_listeners(state.clone(), redis, &bus, &cancel)
            .await
            .expect("failed to join consumer groups"),
    );

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.posts_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("posts service listening on {http_addr}");
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
    for task in background {
        if let Err(e) = task.await {
            warn!(error = %e, "background task ended abnormally");
        }
    }
}
