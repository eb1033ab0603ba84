use chrono::Utc;
use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::repository::{PostRepository, UserRepresentationRepository};
use crate::domain::types::{Post, validate_content, validate_title};
use crate::error::PostsServiceError;

// ── CreatePost ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CreatePostInput {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
}

pub struct CreatePostUseCase<P: PostRepository> {
    pub posts: P,
}

impl<P: PostRepository> CreatePostUseCase<P> {
    /// The author must already be known locally through a user-created event.
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), user_id = %input.user_id), err)]
    pub async fn execute(
        &self,
        ctx: TraceContext,
        input: CreatePostInput,
    ) -> Result<Post, PostsServiceError> {
        if !validate_title(&input.title) {
            return Err(PostsServiceError::InvalidTitle);
        }
        if !validate_content(&input.content) {
            return Err(PostsServiceError::InvalidContent);
        }
        let now = Utc::now();
        let post = Post {
            id: Uuid::now_v7(),
            user_id: Some(input.user_id),
            title: input.title.trim().to_owned(),
            content: input.content,
            created_at: now,
            updated_at: now,
        };
        self.posts.create(ctx, &post).await?;
        tracing::info!(post_id = %post.id, "post created");
        Ok(post)
    }
}

// ── GetPost ──────────────────────────────────────────────────────────────────

pub struct GetPostUseCase<P: PostRepository> {
    pub posts: P,
}

impl<P: PostRepository> GetPostUseCase<P> {
    pub async fn execute(&self, post_id: Uuid) -> Result<Post, PostsServiceError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(PostsServiceError::PostNotFound)
    }
}

// ── ListUserPosts ────────────────────────────────────────────────────────────

pub struct ListUserPostsUseCase<P: PostRepository, U: UserRepresentationRepository> {
    pub posts: P,
    pub users: U,
}

impl<P: PostRepository, U: UserRepresentationRepository> ListUserPostsUseCase<P, U> {
    pub async fn execute(&self, user_id: Uuid) -> Result<Vec<Post>, PostsServiceError> {
        if !self.users.exists(user_id).await? {
            return Err(PostsServiceError::UserNotFound);
        }
        self.posts.list_by_user(user_id).await
    }
}

// ── DeletePost ───────────────────────────────────────────────────────────────

pub struct DeletePostUseCase<P: PostRepository> {
    pub posts: P,
}

impl<P: PostRepository> DeletePostUseCase<P> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %post_id), err)]
    pub async fn execute(&self, ctx: TraceContext, post_id: Uuid) -> Result<(), PostsServiceError> {
        if !self.posts.delete(ctx, post_id).await? {
            return Err(PostsServiceError::PostNotFound);
        }
        tracing::info!("post deleted");
        Ok(())
    }
}
