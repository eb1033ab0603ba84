use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use federation_core::health::{database_ready, healthz};
use federation_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::comment::{create_comment, get_post_comments};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Comments
        .route("/comments", post(create_comment))
        .route("/posts/{id}/comments", get(get_post_comments))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}

async fn readyz(State(state): State<AppState>) -> StatusCode {
    database_ready(&state.db).await
}
