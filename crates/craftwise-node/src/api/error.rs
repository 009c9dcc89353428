//! Mapping of domain errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use craftwise_core::CraftError;
use serde::Serialize;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// A [`CraftError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CraftError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CraftError::RecipeNotFound { .. } | CraftError::ProjectNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            CraftError::CycleDetected { .. }
            | CraftError::TreeTooLarge { .. }
            | CraftError::QuantityOverflow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CraftError::InvalidQuantity { .. } | CraftError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            CraftError::NodeNotFound { .. } | CraftError::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CraftError> for ApiError {
    fn from(err: CraftError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorBody {
            error: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CraftError::RecipeNotFound { id: "x".into() }, StatusCode::NOT_FOUND),
            (
                CraftError::CycleDetected {
                    cycle: vec!["a".into(), "a".into()],
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (CraftError::invalid_quantity("neg"), StatusCode::BAD_REQUEST),
            (
                CraftError::NodeNotFound { path: vec![] },
                StatusCode::CONFLICT,
            ),
            (CraftError::TreeTooLarge { limit: 1 }, StatusCode::UNPROCESSABLE_ENTITY),
            (
                CraftError::StoreError {
                    message: "down".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
