use crate::helpers::JsonResponse;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;

/// Errors that can occur while talking to object storage or a model provider
#[derive(Debug)]
pub enum ConnectorError {
    /// HTTP request/response error
    HttpError(String),
    /// Service unreachable or timeout
    ServiceUnavailable(String),
    /// Invalid response format from external service
    InvalidResponse(String),
    /// Authentication error (401/403)
    Unauthorized(String),
    /// Not found (404)
    NotFound(String),
    /// Caller asked for something the connector cannot do
    BadRequest(String),
    /// Internal error in connector
    Internal(String),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            Self::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectorError {}

impl ResponseError for ConnectorError {
    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::HttpError(_) => "External service error",
            Self::ServiceUnavailable(_) => "Service unavailable",
            Self::InvalidResponse(_) => "Invalid external service response",
            Self::Unauthorized(_) => "Unauthorized",
            Self::NotFound(_) => "Resource not found",
            Self::BadRequest(msg) => msg.as_str(),
            Self::Internal(_) => "Internal error",
        };
        tracing::error!("connector failure: {}", self);

        HttpResponse::build(self.status_code())
            .content_type("application/json")
            .body(JsonResponse::error_text(self.status_code(), message))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::HttpError(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ServiceUnavailable(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            Self::ServiceUnavailable(format!("Connection failed: {}", err))
        } else {
            Self::HttpError(err.to_string())
        }
    }
}
