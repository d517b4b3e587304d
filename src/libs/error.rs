//! Error types for the gateway.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors a request can end with. The display text is what the client sees.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed body, id, or field; or a method/path combination that makes no sense
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("request body too large")]
    PayloadTooLarge,

    /// Query, decode or metadata failure. Only `context` reaches the client.
    #[error("{context}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl GatewayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unknown_table() -> Self {
        Self::NotFound("unknown table")
    }

    pub fn record_not_found() -> Self {
        Self::NotFound("record not found")
    }

    pub fn invalid_field(name: &str) -> Self {
        Self::BadRequest(format!("field {name} have invalid type"))
    }

    /// Adapter for `map_err` that tags a database error with a client-facing message.
    pub fn database(context: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Database { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BytesRejection> for GatewayError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::bad_request("failed to read request body")
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Database { context, source } = &self {
            tracing::error!(error = %source, "{context}");
        }
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}

/// Failures while bringing the server up.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported database url `{0}`: expected mysql:// or sqlite:")]
    UnsupportedUrl(String),

    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::bad_request("invalid id").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GatewayError::unknown_table().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            GatewayError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            GatewayError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let err = GatewayError::database("failed to get record")(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_database_error_hides_source() {
        let err = GatewayError::database("failed to query records")(sqlx::Error::PoolTimedOut);
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body, serde_json::json!({"error": "failed to query records"}));
    }

    #[test]
    fn test_invalid_field_message() {
        let err = GatewayError::invalid_field("price");
        assert_eq!(err.to_string(), "field price have invalid type");
    }
}
