use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{FollowerId, ItemId};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("User not found: {0}")]
    IdentityNotFound(String),

    #[error("Failed to load followed accounts: {0}")]
    DirectoryFetchFailed(String),

    #[error("Failed to load ratings for follower {follower_id}: {reason}")]
    FollowerRatingsFetchFailed {
        follower_id: FollowerId,
        reason: String,
    },

    #[error("Failed to fetch follower ratings for item {item_id}: {reason}")]
    BatchFetchFailed { item_id: ItemId, reason: String },

    #[error("Unknown follower: {0}")]
    UnknownFollower(FollowerId),

    #[error("Superseded by a newer root user load")]
    Superseded,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::IdentityNotFound(_) | AppError::UnknownFollower(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Superseded => StatusCode::CONFLICT,
            AppError::DirectoryFetchFailed(_)
            | AppError::FollowerRatingsFetchFailed { .. }
            | AppError::BatchFetchFailed { .. }
            | AppError::HttpClient(_)
            | AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::IdentityNotFound("nobody".into()), StatusCode::NOT_FOUND),
            (AppError::UnknownFollower(4), StatusCode::NOT_FOUND),
            (AppError::Superseded, StatusCode::CONFLICT),
            (
                AppError::BatchFetchFailed {
                    item_id: 1,
                    reason: "timeout".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_follower_error_message() {
        let error = AppError::FollowerRatingsFetchFailed {
            follower_id: 42,
            reason: "status 500".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load ratings for follower 42: status 500"
        );
    }
}
