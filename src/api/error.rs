use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::service::ServiceError;

/// Error returned by handlers, rendered as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The blocking task running the service panicked or was cancelled.
    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Service(err @ ServiceError::InvalidArgument { .. }) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Service(err @ ServiceError::Conflict(_)) => {
                error!(error = %err, "unresolved write conflict");
                (
                    StatusCode::CONFLICT,
                    "Conflicting concurrent write, retry the request".to_string(),
                )
            }
            Self::Service(err @ ServiceError::Store(_)) => {
                error!(error = %err, "store failure");
                internal()
            }
            Self::Task(err) => {
                error!(error = %err, "request task failed");
                internal()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error".to_string(),
    )
}
