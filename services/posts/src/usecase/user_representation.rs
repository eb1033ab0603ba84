use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::repository::UserRepresentationRepository;
use crate::error::PostsServiceError;

// ── CreateUserRepresentation ─────────────────────────────────────────────────

pub struct CreateUserRepresentationUseCase<U: UserRepresentationRepository> {
    pub users: U,
}

impl<U: UserRepresentationRepository> CreateUserRepresentationUseCase<U> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %user_id), err)]
    pub async fn execute(&self, ctx: TraceContext, user_id: Uuid) -> Result<(), PostsServiceError> {
        if !self.users.create_if_absent(user_id).await? {
            tracing::debug!("user representation already present or deleted");
        }
        Ok(())
    }
}

// ── DeleteUserRepresentation ─────────────────────────────────────────────────

/// Mark a user deleted and unlink their posts. A second run finds nothing
/// to unlink and succeeds.
pub struct DeleteUserRepresentationUseCase<U: UserRepresentationRepository> {
    pub users: U,
}

impl<U: UserRepresentationRepository> DeleteUserRepresentationUseCase<U> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %user_id), err)]
    pub async fn execute(&self, ctx: TraceContext, user_id: Uuid) -> Result<u64, PostsServiceError> {
        let unlinked = self.users.remove_and_unlink_posts(user_id).await?;
        tracing::info!(unlinked, "posts unlinked from deleted user");
        Ok(unlinked)
    }
}
