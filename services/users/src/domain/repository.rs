#![allow(async_fn_in_trait)]

use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::types::User;
use crate::error::UsersServiceError;

/// Repository for user profiles.
///
/// Mutations record their domain event in the outbox within the same
/// transaction as the row change.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UsersServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UsersServiceError>;
    async fn create(&self, ctx: TraceContext, user: &User) -> Result<(), UsersServiceError>;
    /// Returns `false` when no user with `id` existed; nothing is emitted then.
    async fn delete(&self, ctx: TraceContext, id: Uuid) -> Result<bool, UsersServiceError>;
}
