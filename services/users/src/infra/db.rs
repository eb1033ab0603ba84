use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, TransactionTrait,
};
use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{DomainEvent, UserCreated, UserDeleted, UserEvent};
use federation_outbox::{OutboxError, SeaOrmOutboxStore};
use federation_users_schema::users;

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::UsersServiceError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    db: DatabaseConnection,
    outbox: SeaOrmOutboxStore,
}

impl DbUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            outbox: SeaOrmOutboxStore,
        }
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UsersServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UsersServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, ctx: TraceContext, user: &User) -> Result<(), UsersServiceError> {
        let outbox = self.outbox;
        let user = user.clone();
        self.db
            .transaction::<_, (), OutboxError>(move |txn| {
                Box::pin(async move {
                    users::ActiveModel {
                        id: Set(user.id),
                        name: Set(user.name),
                        email: Set(user.email),
                        created_at: Set(user.created_at),
                        updated_at: Set(user.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    let event = DomainEvent::from(UserEvent::Created(UserCreated {
                        id: user.id.into(),
                    }));
                    outbox.append(txn, ctx, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("create user with outbox")?;
        Ok(())
    }

    async fn delete(&self, ctx: TraceContext, id: Uuid) -> Result<bool, UsersServiceError> {
        let outbox = self.outbox;
        let deleted = self
            .db
            .transaction::<_, bool, OutboxError>(move |txn| {
                Box::pin(async move {
                    let result = users::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Ok(false);
                    }
                    let event = DomainEvent::from(UserEvent::Deleted(UserDeleted { id: id.into() }));
                    outbox.append(txn, ctx, &event).await?;
                    Ok(true)
                })
            })
            .await
            .context("delete user with outbox")?;
        Ok(deleted)
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
