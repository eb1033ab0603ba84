//! Reactions to upstream user and post events. All of them are idempotent.

use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::repository::{PostRepresentationRepository, UserRepresentationRepository};
use crate::error::CommentsServiceError;

// ── CreateUserRepresentation ─────────────────────────────────────────────────

pub struct CreateUserRepresentationUseCase<U: UserRepresentationRepository> {
    pub users: U,
}

impl<U: UserRepresentationRepository> CreateUserRepresentationUseCase<U> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %user_id), err)]
    pub async fn execute(
        &self,
        ctx: TraceContext,
        user_id: Uuid,
    ) -> Result<(), CommentsServiceError> {
        if !self.users.create_if_absent(user_id).await? {
            tracing::debug!("user representation already present or deleted");
        }
        Ok(())
    }
}

// ── DeleteUserRepresentation ─────────────────────────────────────────────────

pub struct DeleteUserRepresentationUseCase<U: UserRepresentationRepository> {
    pub users: U,
}

impl<U: UserRepresentationRepository> DeleteUserRepresentationUseCase<U> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %user_id), err)]
    pub async fn execute(
        &self,
        ctx: TraceContext,
        user_id: Uuid,
    ) -> Result<u64, CommentsServiceError> {
        let unlinked = self.users.remove_and_unlink_comments(user_id).await?;
        tracing::info!(unlinked, "comments unlinked from deleted user");
        Ok(unlinked)
    }
}

// ── CreatePostRepresentation ─────────────────────────────────────────────────

pub struct CreatePostRepresentationUseCase<P: PostRepresentationRepository> {
    pub posts: P,
}

impl<P: PostRepresentationRepository> CreatePostRepresentationUseCase<P> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %post_id), err)]
    pub async fn execute(
        &self,
        ctx: TraceContext,
        post_id: Uuid,
    ) -> Result<(), CommentsServiceError> {
        if !self.posts.create_if_absent(post_id).await? {
            tracing::debug!("post representation already present or deleted");
        }
        Ok(())
    }
}

// ── DeletePostRepresentation ─────────────────────────────────────────────────

pub struct DeletePostRepresentationUseCase<P: PostRepresentationRepository> {
    pub posts: P,
}

impl<P: PostRepresentationRepository> DeletePostRepresentationUseCase<P> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %post_id), err)]
    pub async fn execute(
        &self,
        ctx: TraceContext,
        post_id: Uuid,
    ) -> Result<u64, CommentsServiceError> {
        let deleted = self.posts.remove_with_comments(post_id).await?;
        tracing::info!(deleted, "comments of deleted post removed");
        Ok(deleted)
    }
}
