use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures reported by the content catalog
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Catalog rejected request: {0}")]
    BadRequest(String),

    #[error("Catalog server error: {0}")]
    ServerError(String),

    #[error("Catalog unreachable: {0}")]
    Network(String),

    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            if status.is_client_error() {
                CatalogError::BadRequest(e.to_string())
            } else {
                CatalogError::ServerError(e.to_string())
            }
        } else {
            CatalogError::Network(e.to_string())
        }
    }
}

/// Failures reported by the decision store
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Decision store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Conditions surfaced by the discovery feed engine
///
/// None of these are fatal: each is recoverable at the session level.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("No current item to classify")]
    NoCurrentItem,

    #[error("A classification is already in progress")]
    ClassificationInProgress,

    #[error("Feed session was superseded")]
    SessionStale,
}

impl From<CatalogError> for FeedError {
    fn from(e: CatalogError) -> Self {
        FeedError::CollaboratorUnavailable(e.to_string())
    }
}

impl From<StoreError> for FeedError {
    fn from(e: StoreError) -> Self {
        FeedError::CollaboratorUnavailable(e.to_string())
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Catalog(CatalogError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            AppError::Catalog(_) | AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Feed(FeedError::NoCurrentItem) => StatusCode::NOT_FOUND,
            AppError::Feed(FeedError::ClassificationInProgress)
            | AppError::Feed(FeedError::SessionStale) => StatusCode::CONFLICT,
            AppError::Feed(FeedError::CollaboratorUnavailable(_)) => StatusCode::BAD_GATEWAY,
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
    fn test_feed_error_status_codes() {
        let cases = [
            (FeedError::NoCurrentItem, StatusCode::NOT_FOUND),
            (FeedError::ClassificationInProgress, StatusCode::CONFLICT),
            (FeedError::SessionStale, StatusCode::CONFLICT),
            (
                FeedError::CollaboratorUnavailable("down".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_catalog_bad_request_is_client_error() {
        let response =
            AppError::from(CatalogError::BadRequest("empty query".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_and_identity_status_codes() {
        let response =
            AppError::from(StoreError::Unavailable("pool timed out".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = AppError::Unauthorized("missing x-user-id header".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_collaborator_errors_convert_to_feed_error() {
        let err: FeedError = CatalogError::Network("timeout".to_string()).into();
        assert!(matches!(err, FeedError::CollaboratorUnavailable(msg) if msg.contains("timeout")));
    }
}
