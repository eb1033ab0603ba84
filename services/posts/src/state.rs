use sea_orm::DatabaseConnection;

use crate::infra::db::{DbPostRepository, DbUserRepresentationRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn post_repo(&self) -> DbPostRepository {
        DbPostRepository::new(self.db.clone())
    }

    pub fn user_representation_repo(&self) -> DbUserRepresentationRepository {
        DbUserRepresentationRepository {
            db: self.db.clone(),
        }
    }
}
