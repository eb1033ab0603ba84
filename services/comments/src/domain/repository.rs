#![allow(async_fn_in_trait)]

use uuid::Uuid;

use crate::domain::types::Comment;
use crate::error::CommentsServiceError;

/// Repository for comments.
pub trait CommentRepository: Send + Sync {
    /// Oldest first.
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, CommentsServiceError>;
    /// Fails with `PostNotFound` or `UserNotFound` unless both are known and
    /// not deleted, checked in the same transaction as the insert.
    async fn create(&self, comment: &Comment) -> Result<(), CommentsServiceError>;
}

/// Local view of users. Every operation is safe to repeat, and creation and
/// deletion events may arrive in either order.
pub trait UserRepresentationRepository: Send + Sync {
    /// False if the user is already present or was deleted.
    async fn create_if_absent(&self, user_id: Uuid) -> Result<bool, CommentsServiceError>;
    /// Mark the user deleted and clear `user_id` on the user's comments,
    /// atomically. Returns the number of comments unlinked.
    async fn remove_and_unlink_comments(&self, user_id: Uuid)
    -> Result<u64, CommentsServiceError>;
}

/// Local view of posts, with the same ordering rules as users.
pub trait PostRepresentationRepository: Send + Sync {
    /// Announced and not deleted.
    async fn exists(&self, post_id: Uuid) -> Result<bool, CommentsServiceError>;
    /// False if the post is already present or was deleted.
    async fn create_if_absent(&self, post_id: Uuid) -> Result<bool, CommentsServiceError>;
    /// Mark the post deleted and delete every comment on it, atomically.
    /// Returns the number of comments deleted.
    async fn remove_with_comments(&self, post_id: Uuid) -> Result<u64, CommentsServiceError>;
}
