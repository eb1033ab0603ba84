#![allow(async_fn_in_trait)]

use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::types::Post;
use crate::error::PostsServiceError;

/// Repository for posts. Mutations record their event in the outbox in the
/// same transaction.
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, PostsServiceError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, PostsServiceError>;
    /// Fails with `UserNotFound` unless the author is known and not deleted,
    /// checked in the same transaction as the insert.
    async fn create(&self, ctx: TraceContext, post: &Post) -> Result<(), PostsServiceError>;
    /// Returns `false` when no such post existed; nothing is emitted then.
    async fn delete(&self, ctx: TraceContext, id: Uuid) -> Result<bool, PostsServiceError>;
}

/// Local view of users known to the users service.
///
/// Every operation is safe to repeat, and creation and deletion events may
/// arrive in either order: a deleted user stays deleted.
pub trait UserRepresentationRepository: Send + Sync {
    /// Announced and not deleted.
    async fn exists(&self, user_id: Uuid) -> Result<bool, PostsServiceError>;
    /// Returns `false` if the representation was already present or deleted.
    async fn create_if_absent(&self, user_id: Uuid) -> Result<bool, PostsServiceError>;
    /// Mark the user deleted and clear `user_id` on every post by that user,
    /// atomically. Returns the number of posts unlinked.
    async fn remove_and_unlink_posts(&self, user_id: Uuid) -> Result<u64, PostsServiceError>;
}
