use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_events::{DomainEvent, PostCreated, PostDeleted, PostEvent};
use federation_outbox::{OutboxError, SeaOrmOutboxStore};
use federation_posts_schema::{posts, user_representations};

use crate::domain::repository::{PostRepository, UserRepresentationRepository};
use crate::domain::types::Post;
use crate::error::PostsServiceError;

// ── Post repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPostRepository {
    db: DatabaseConnection,
    outbox: SeaOrmOutboxStore,
}

impl DbPostRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            outbox: SeaOrmOutboxStore,
        }
    }
}

impl PostRepository for DbPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, PostsServiceError> {
        let model = posts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find post by id")?;
        Ok(model.map(post_from_model))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, PostsServiceError> {
        let models = posts::Entity::find()
            .filter(posts::Column::UserId.eq(user_id))
            .order_by_desc(posts::Column::CreatedAt)
            .order_by_desc(posts::Column::Id)
            .all(&self.db)
            .await
            .context("list posts by user")?;
        Ok(models.into_iter().map(post_from_model).collect())
    }

    async fn create(&self, ctx: TraceContext, post: &Post) -> Result<(), PostsServiceError> {
        let user_id = post
            .user_id
            .context("new post must have an author")?;
        let outbox = self.outbox;
        let post = post.clone();
        let created = self
            .db
            .transaction::<_, bool, OutboxError>(move |txn| {
                Box::pin(async move {
                    // Held until commit, so a concurrent user deletion waits
                    // and then unlinks this post too.
                    if !live_user(txn, user_id, true).await? {
                        return Ok(false);
                    }
                    posts::ActiveModel {
                        id: Set(post.id),
                        user_id: Set(post.user_id),
                        title: Set(post.title),
                        content: Set(post.content),
                        created_at: Set(post.created_at),
                        updated_at: Set(post.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    let event = DomainEvent::from(PostEvent::Created(PostCreated {
                        id: post.id.into(),
                        user_id: user_id.into(),
                    }));
                    outbox.append(txn, ctx, &event).await?;
                    Ok(true)
                })
            })
            .await
            .context("create post with outbox")?;
        if !created {
            return Err(PostsServiceError::UserNotFound);
        }
        Ok(())
    }

    async fn delete(&self, ctx: TraceContext, id: Uuid) -> Result<bool, PostsServiceError> {
        let outbox = self.outbox;
        let deleted = self
            .db
            .transaction::<_, bool, OutboxError>(move |txn| {
                Box::pin(async move {
                    let result = posts::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Ok(false);
                    }
                    let event =
                        DomainEvent::from(PostEvent::Deleted(PostDeleted { id: id.into() }));
                    outbox.append(txn, ctx, &event).await?;
                    Ok(true)
                })
            })
            .await
            .context("delete post with outbox")?;
        Ok(deleted)
    }
}

fn post_from_model(model: posts::Model) -> Post {
    Post {
        id: model.id,
        user_id: model.user_id,
        title: model.title,
        content: model.content,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── User representation repository ───────────────────────────────────────────

/// Whether `user_id` is announced and not deleted. With `lock`, the row is
/// share-locked until the surrounding transaction ends.
async fn live_user<C>(conn: &C, user_id: Uuid, lock: bool) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = user_representations::Entity::find_by_id(user_id)
        .filter(user_representations::Column::DeletedAt.is_null());
    if lock {
        query = query.lock_shared();
    }
    Ok(query.one(conn).await?.is_some())
}

#[derive(Clone)]
pub struct DbUserRepresentationRepository {
    pub db: DatabaseConnection,
}

impl UserRepresentationRepository for DbUserRepresentationRepository {
    async fn exists(&self, user_id: Uuid) -> Result<bool, PostsServiceError> {
        let live = live_user(&self.db, user_id, false)
            .await
            .context("find user representation")?;
        Ok(live)
    }

    async fn create_if_absent(&self, user_id: Uuid) -> Result<bool, PostsServiceError> {
        let inserted = user_representations::Entity::insert(user_representations::ActiveModel {
            id: Set(user_id),
            created_at: Set(Utc::now()),
            deleted_at: Set(None),
        })
        .on_conflict(
            OnConflict::column(user_representations::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("insert user representation")?;
        Ok(inserted > 0)
    }

    async fn remove_and_unlink_posts(&self, user_id: Uuid) -> Result<u64, PostsServiceError> {
        let unlinked = self
            .db
            .transaction::<_, u64, DbErr>(move |txn| {
                Box::pin(async move {
                    // Tombstone first: the row lock waits out in-flight post
                    // creations, whose rows the unlink below then sees.
                    let now = Utc::now();
                    user_representations::Entity::insert(user_representations::ActiveModel {
                        id: Set(user_id),
                        created_at: Set(now),
                        deleted_at: Set(Some(now)),
                    })
                    .on_conflict(
                        OnConflict::column(user_representations::Column::Id)
                            .update_column(user_representations::Column::DeletedAt)
                            .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await?;
                    let unlinked = posts::Entity::update_many()
                        .col_expr(posts::Column::UserId, Expr::value(Option::<Uuid>::None))
                        .col_expr(posts::Column::UpdatedAt, Expr::value(now))
                        .filter(posts::Column::UserId.eq(user_id))
                        .exec(txn)
                        .await?;
                    Ok(unlinked.rows_affected)
                })
            })
            .await
            .context("unlink posts from user")?;
        Ok(unlinked)
    }
}
