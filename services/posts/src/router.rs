use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use federation_core::health::{database_ready, healthz};
use federation_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::post::{create_post, delete_post, get_post, get_user_posts};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Posts
        .route("/posts", post(create_post))
        .route("/posts/{id}", get(get_post).delete(delete_post))
        .route("/users/{id}/posts", get(get_user_posts))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}

async fn readyz(State(state): State<AppState>) -> StatusCode {
    database_ready(&state.db).await
}
