use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::types::Post;
use crate::error::PostsServiceError;
use crate::state::AppState;
use crate::usecase::post::{
    CreatePostInput, CreatePostUseCase, DeletePostUseCase, GetPostUseCase, ListUserPostsUseCase,
};

#[derive(Serialize)]
pub struct PostResponse {
    pub id: String,
    /// `null` once the author has been deleted.
    pub user_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(serialize_with = "federation_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "federation_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_string(),
            user_id: post.user_id.map(|id| id.to_string()),
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

// ── POST /posts ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
}

pub async fn create_post(
    ctx: TraceContext,
    State(state): State<AppState>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), PostsServiceError> {
    let usecase = CreatePostUseCase {
        posts: state.post_repo(),
    };
    let post = usecase
        .execute(
            ctx,
            CreatePostInput {
                user_id: body.user_id,
                title: body.title,
                content: body.content,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

// ── GET /posts/{id} ──────────────────────────────────────────────────────────

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, PostsServiceError> {
    let usecase = GetPostUseCase {
        posts: state.post_repo(),
    };
    let post = usecase.execute(id).await?;
    Ok(Json(post.into()))
}

// ── GET /users/{id}/posts ────────────────────────────────────────────────────

pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<PostResponse>>, PostsServiceError> {
    let usecase = ListUserPostsUseCase {
        posts: state.post_repo(),
        users: state.user_representation_repo(),
    };
    let posts = usecase.execute(user_id).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

// ── DELETE /posts/{id} ───────────────────────────────────────────────────────

pub async fn delete_post(
    ctx: TraceContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, PostsServiceError> {
    let usecase = DeletePostUseCase {
        posts: state.post_repo(),
    };
    usecase.execute(ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
