//! API error types with JSON `{ "error": ... }` responses.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::INVALID_INPUT_MESSAGE;
use crate::screening::ScreeningError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", INVALID_INPUT_MESSAGE)]
    InvalidInput,
    /// The request body could not be read (e.g. over the size limit).
    #[error(transparent)]
    Body(#[from] BytesRejection),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput => (StatusCode::BAD_REQUEST, INVALID_INPUT_MESSAGE.to_string()),
            ApiError::Body(rejection) => {
                tracing::warn!(status = %rejection.status(), "Request body rejected");
                (rejection.status(), rejection.body_text())
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "Prediction failed");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<ScreeningError> for ApiError {
    fn from(err: ScreeningError) -> Self {
        match err {
            ScreeningError::Validation(_) => ApiError::InvalidInput,
            ScreeningError::Internal(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("prediction worker failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn invalid_input_returns_400_with_fixed_message() {
        let response = ApiError::InvalidInput.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "Invalid input. Ensure correct fields and feature length."
        );
    }

    #[tokio::test]
    async fn internal_returns_500_with_detail() {
        let response = ApiError::Internal("Document store returned 503: busy".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        // Callers see the underlying failure text
        assert_eq!(json["error"], "Document store returned 503: busy");
    }

    #[tokio::test]
    async fn validation_error_maps_to_400() {
        let err = crate::models::PredictionRequest::from_body(b"[]").unwrap_err();
        let api_err: ApiError = ScreeningError::Validation(err).into();
        assert_eq!(api_err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_screening_error_keeps_message() {
        let api_err: ApiError = ScreeningError::Internal("Model inference failed: nan".into()).into();
        let json = body_json(api_err.into_response()).await;
        assert_eq!(json["error"], "Model inference failed: nan");
    }

    #[test]
    fn validation_display_is_the_client_message() {
        let err = crate::models::PredictionRequest::from_body(b"{}").unwrap_err();
        assert_eq!(err.to_string(), INVALID_INPUT_MESSAGE);
        assert_eq!(ApiError::InvalidInput.to_string(), INVALID_INPUT_MESSAGE);
    }
}
