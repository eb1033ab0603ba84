use chrono::Utc;
use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::repository::{CommentRepository, PostRepresentationRepository};
use crate::domain::types::{Comment, validate_content};
use crate::error::CommentsServiceError;

// ── CreateComment ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CreateCommentInput {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub content: String,
}

pub struct CreateCommentUseCase<C: CommentRepository> {
    pub comments: C,
}

impl<C: CommentRepository> CreateCommentUseCase<C> {
    #[tracing::instrument(
        skip_all,
        fields(trace_id = %ctx.trace_id(), user_id = %input.user_id, post_id = %input.post_id),
        err
    )]
    pub async fn execute(
        &self,
        ctx: TraceContext,
        input: CreateCommentInput,
    ) -> Result<Comment, CommentsServiceError> {
        if !validate_content(&input.content) {
            return Err(CommentsServiceError::InvalidContent);
        }
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::now_v7(),
            user_id: Some(input.user_id),
            post_id: input.post_id,
            content: input.content,
            created_at: now,
            updated_at: now,
        };
        self.comments.create(&comment).await?;
        tracing::info!(comment_id = %comment.id, "comment created");
        Ok(comment)
    }
}

// ── ListPostComments ─────────────────────────────────────────────────────────

pub struct ListPostCommentsUseCase<C: CommentRepository, P: PostRepresentationRepository> {
    pub comments: C,
    pub posts: P,
}

impl<C: CommentRepository, P: PostRepresentationRepository> ListPostCommentsUseCase<C, P> {
    pub async fn execute(&self, post_id: Uuid) -> Result<Vec<Comment>, CommentsServiceError> {
        if !self.posts.exists(post_id).await? {
            return Err(CommentsServiceError::PostNotFound);
        }
        self.comments.list_by_post(post_id).await
    }
}
