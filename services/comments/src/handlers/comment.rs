use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::types::Comment;
use crate::error::CommentsServiceError;
use crate::state::AppState;
use crate::usecase::comment::{CreateCommentInput, CreateCommentUseCase, ListPostCommentsUseCase};

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub post_id: String,
    pub content: String,
    #[serde(serialize_with = "federation_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "federation_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            user_id: comment.user_id.map(|id| id.to_string()),
            post_id: comment.post_id.to_string(),
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

// ── POST /comments ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub content: String,
}

pub async fn create_comment(
    ctx: TraceContext,
    State(state): State<AppState>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), CommentsServiceError> {
    let usecase = CreateCommentUseCase {
        comments: state.comment_repo(),
    };
    let comment = usecase
        .execute(
            ctx,
            CreateCommentInput {
                user_id: body.user_id,
                post_id: body.post_id,
                content: body.content,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

// ── GET /posts/{id}/comments ─────────────────────────────────────────────────

pub async fn get_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<CommentResponse>>, CommentsServiceError> {
    let usecase = ListPostCommentsUseCase {
        comments: state.comment_repo(),
        posts: state.post_representation_repo(),
    };
    let comments = usecase.execute(post_id).await?;
    Ok(Json(
        comments.into_iter().map(CommentResponse::from).collect(),
    ))
}
