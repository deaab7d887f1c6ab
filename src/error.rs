use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use thiserror::Error;

pub type InsightResult<T> = Result<T, InsightError>;

#[derive(Debug, Error)]
pub enum InsightError {
    /// Two sorted entry dates that are not strictly increasing.
    #[error("invalid interval between {previous} and {next}")]
    InvalidInterval { previous: NaiveDate, next: NaiveDate },

    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("corrupt stored row: {0}")]
    CorruptRow(String),
}

impl InsightError {
    /// Errors worth retrying from the deferred advice job.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InsightError::Persistence(
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            InsightError::InvalidInterval { .. } | InsightError::InvalidEntry(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            InsightError::Persistence(_) | InsightError::CorruptRow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::warn!("⚠️ {}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
