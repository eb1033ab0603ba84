use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use federation_comments_schema::{comments, post_representations, user_representations};

use crate::domain::repository::{
    CommentRepository, PostRepresentationRepository, UserRepresentationRepository,
};
use crate::domain::types::Comment;
use crate::error::CommentsServiceError;

// ── Comment repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCommentRepository {
    pub db: DatabaseConnection,
}

impl CommentRepository for DbCommentRepository {
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, CommentsServiceError> {
        let models = comments::Entity::find()
            .filter(comments::Column::PostId.eq(post_id))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .all(&self.db)
            .await
            .context("list comments by post")?;
        Ok(models.into_iter().map(comment_from_model).collect())
    }

    async fn create(&self, comment: &Comment) -> Result<(), CommentsServiceError> {
        let user_id = comment
            .user_id
            .context("new comment must have an author")?;
        let comment = comment.clone();
        let missing = self
            .db
            .transaction::<_, Option<CommentsServiceError>, DbErr>(move |txn| {
                Box::pin(async move {
                    // Both rows stay share-locked until commit, so a concurrent
                    // deletion waits and then sees this comment.
                    if !live_post(txn, comment.post_id, true).await? {
                        return Ok(Some(CommentsServiceError::PostNotFound));
                    }
                    if !live_user(txn, user_id, true).await? {
                        return Ok(Some(CommentsServiceError::UserNotFound));
                    }
                    comments::ActiveModel {
                        id: Set(comment.id),
                        user_id: Set(comment.user_id),
                        post_id: Set(comment.post_id),
                        content: Set(comment.content),
                        created_at: Set(comment.created_at),
                        updated_at: Set(comment.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    Ok(None)
                })
            })
            .await
            .context("create comment")?;
        match missing {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn comment_from_model(model: comments::Model) -> Comment {
    Comment {
        id: model.id,
        user_id: model.user_id,
        post_id: model.post_id,
        content: model.content,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Representation repositories ──────────────────────────────────────────────

/// Whether the user is announced and not deleted. With `lock`, the row is
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

/// Same as [`live_user`] for posts.
async fn live_post<C>(conn: &C, post_id: Uuid, lock: bool) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = post_representations::Entity::find_by_id(post_id)
        .filter(post_representations::Column::DeletedAt.is_null());
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
    async fn create_if_absent(&self, user_id: Uuid) -> Result<bool, CommentsServiceError> {
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

    async fn remove_and_unlink_comments(
        &self,
        user_id: Uuid,
    ) -> Result<u64, CommentsServiceError> {
        let unlinked = self
            .db
            .transaction::<_, u64, DbErr>(move |txn| {
                Box::pin(async move {
                    // Tombstone first so in-flight comment creations finish
                    // before the unlink runs.
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
                    let unlinked = comments::Entity::update_many()
                        .col_expr(comments::Column::UserId, Expr::value(Option::<Uuid>::None))
                        .col_expr(comments::Column::UpdatedAt, Expr::value(now))
                        .filter(comments::Column::UserId.eq(user_id))
                        .exec(txn)
                        .await?;
                    Ok(unlinked.rows_affected)
                })
            })
            .await
            .context("unlink comments from user")?;
        Ok(unlinked)
    }
}

#[derive(Clone)]
pub struct DbPostRepresentationRepository {
    pub db: DatabaseConnection,
}

impl PostRepresentationRepository for DbPostRepresentationRepository {
    async fn exists(&self, post_id: Uuid) -> Result<bool, CommentsServiceError> {
        let live = live_post(&self.db, post_id, false)
            .await
            .context("find post representation")?;
        Ok(live)
    }

    async fn create_if_absent(&self, post_id: Uuid) -> Result<bool, CommentsServiceError> {
        let inserted = post_representations::Entity::insert(post_representations::ActiveModel {
            id: Set(post_id),
            created_at: Set(Utc::now()),
            deleted_at: Set(None),
        })
        .on_conflict(
            OnConflict::column(post_representations::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("insert post representation")?;
        Ok(inserted > 0)
    }

    async fn remove_with_comments(&self, post_id: Uuid) -> Result<u64, CommentsServiceError> {
        let deleted = self
            .db
            .transaction::<_, u64, DbErr>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    post_representations::Entity::insert(post_representations::ActiveModel {
                        id: Set(post_id),
                        created_at: Set(now),
                        deleted_at: Set(Some(now)),
                    })
                    .on_conflict(
                        OnConflict::column(post_representations::Column::Id)
                            .update_column(post_representations::Column::DeletedAt)
                            .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await?;
                    let deleted = comments::Entity::delete_many()
                        .filter(comments::Column::PostId.eq(post_id))
                        .exec(txn)
                        .await?;
                    Ok(deleted.rows_affected)
                })
            })
            .await
            .context("delete comments of post")?;
        Ok(deleted)
    }
}
