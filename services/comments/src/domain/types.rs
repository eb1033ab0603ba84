use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    /// `None` once the author has been deleted.
    pub user_id: Option<Uuid>,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MAX_CONTENT_CHARS: usize = 5_000;

pub fn validate_content(content: &str) -> bool {
    !content.trim().is_empty() && content.chars().count() <= MAX_CONTENT_CHARS
}
