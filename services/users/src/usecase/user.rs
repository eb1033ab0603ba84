use chrono::Utc;
use uuid::Uuid;

use federation_core::trace::TraceContext;

use crate::domain::repository::UserRepository;
use crate::domain::types::{User, validate_email, validate_name};
use crate::error::UsersServiceError;

// ── CreateUser ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
}

pub struct CreateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> CreateUserUseCase<R> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id()), err)]
    pub async fn execute(
        &self,
        ctx: TraceContext,
        input: CreateUserInput,
    ) -> Result<User, UsersServiceError> {
        if !validate_name(&input.name) {
            return Err(UsersServiceError::InvalidName);
        }
        let email = input.email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(UsersServiceError::InvalidEmail);
        }
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(UsersServiceError::UserAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            name: input.name.trim().to_owned(),
            email,
            created_at: now,
            updated_at: now,
        };
        self.repo.create(ctx, &user).await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> GetUserUseCase<R> {
    pub async fn execute(&self, user_id: Uuid) -> Result<User, UsersServiceError> {
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> DeleteUserUseCase<R> {
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id(), %user_id), err)]
    pub async fn execute(&self, ctx: TraceContext, user_id: Uuid) -> Result<(), UsersServiceError> {
        if !self.repo.delete(ctx, user_id).await? {
            return Err(UsersServiceError::UserNotFound);
        }
        tracing::info!("user deleted");
        Ok(())
    }
}
