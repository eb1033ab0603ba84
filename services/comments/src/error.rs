use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Comments service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum CommentsServiceError {
    #[error("post not found")]
    PostNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid content")]
    InvalidContent,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl CommentsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PostNotFound => "POST_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidContent => "INVALID_CONTENT",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for CommentsServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::PostNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidContent => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
