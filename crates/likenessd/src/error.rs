use crate::engine::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use likeness_core::CompareError;
use serde_json::json;

/// Every way a request can end other than success.
///
/// Client-input problems are 400s with fixed messages; everything else is a
/// 500 carrying the underlying error text. The body is always
/// `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingField(&'static str),

    #[error("{0}")]
    NotDetected(&'static str),

    /// Malformed or oversized multipart stream.
    #[error("{0}")]
    Multipart(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Compare(#[from] CompareError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::NotDetected(_) | ApiError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Engine(_) | ApiError::Compare(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likeness_core::{NormalizationError, PipelineError};

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::MissingField("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotDetected("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        let engine = EngineError::Pipeline(PipelineError::Normalize(NormalizationError::ZeroNorm));
        assert_eq!(
            ApiError::Engine(engine).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Engine(EngineError::ChannelClosed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Multipart("Request payload is too large".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_message_is_underlying_text() {
        let err = ApiError::Engine(EngineError::Pipeline(PipelineError::Normalize(
            NormalizationError::ZeroNorm,
        )));
        assert_eq!(err.to_string(), "embedding has zero L2 norm");
        assert_eq!(
            ApiError::MissingField("Please upload an image with key 'image'").to_string(),
            "Please upload an image with key 'image'"
        );
    }
}
