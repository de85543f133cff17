use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::remote::RemoteError;

/// Failures surfaced by plan mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),
    #[error("plan not found")]
    NotFound,
    #[error("credential rejected, sign in again")]
    Unauthorized,
    #[error("plan service unavailable: {0}")]
    Unavailable(String),
    #[error("another plan generation is already in progress")]
    Busy,
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::NotFound => Self::NotFound,
            RemoteError::Unauthorized => Self::Unauthorized,
            RemoteError::Validation(msg) => Self::Validation(msg),
            RemoteError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}

impl SyncError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Busy => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_keep_their_kind() {
        assert_eq!(SyncError::from(RemoteError::NotFound), SyncError::NotFound);
        assert_eq!(SyncError::from(RemoteError::Unauthorized), SyncError::Unauthorized);
        assert_eq!(
            SyncError::from(RemoteError::Unavailable("timeout".into())),
            SyncError::Unavailable("timeout".into())
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(SyncError::Busy.status(), StatusCode::CONFLICT);
        assert_eq!(SyncError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            SyncError::Unavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
