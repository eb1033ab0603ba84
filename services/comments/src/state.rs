use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbCommentRepository, DbPostRepresentationRepository, DbUserRepresentationRepository,
};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn comment_repo(&self) -> DbCommentRepository {
        DbCommentRepository {
            db: self.db.clone(),
        }
    }

    pub fn user_representation_repo(&self) -> DbUserRepresentationRepository {
        DbUserRepresentationRepository {
            db: self.db.clone(),
        }
    }

    pub fn post_representation_repo(&self) -> DbPostRepresentationRepository {
        DbPostRepresentationRepository {
            db: self.db.clone(),
        }
    }
}
