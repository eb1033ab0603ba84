use sea_orm::DatabaseConnection;

use crate::infra::db::DbUserRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository::new(self.db.clone())
    }
}
