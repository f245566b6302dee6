//! HTTP error types for the exporter server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::Error;

/// Error wrapper for converting exporter errors to HTTP responses.
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_type = match &self.0 {
            Error::InvalidConfig(_) => "config",
            Error::Collector(_) => "collector",
            Error::Encoding(_) | Error::Io(_) => "internal",
        };
        tracing::error!(error = %self.0, "failed to serve metrics");

        let body = serde_json::json!({
            "status": "error",
            "errorType": error_type,
            "error": self.0.to_string()
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_encoding_error_to_internal_server_error() {
        // given
        let error = ApiError(Error::Encoding("broken pipe".to_string()));

        // when
        let response = error.into_response();

        // then
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
