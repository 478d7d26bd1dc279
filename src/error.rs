// HTTP API Error Types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::database::StoreError;
use crate::middleware::response::Envelope;

const DEFAULT_MESSAGE: &str = "Something went wrong.";

/// A problem with one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every way a request can fail. Handlers return this and never build error
/// bodies themselves; see [`ApiError::normalize`].
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest {
        message: String,
        errors: Vec<FieldError>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    /// A failure that already carries its HTTP status
    WithStatus { status: StatusCode, message: String },

    /// Raised by the store layer; classified during normalization
    Store(StoreError),

    /// Anything else
    Unexpected(anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Bad input pinned to a single field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::BadRequest {
            errors: vec![FieldError::new(field, message.clone())],
            message,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::WithStatus {
            status,
            message: message.into(),
        }
    }

    /// Get HTTP status code.
    ///
    /// Errors that carry a status keep it. Store errors become 400 when the
    /// store rejected the request and 500 otherwise. Everything else is 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::WithStatus { status, .. } => *status,
            ApiError::Store(err) if err.is_rejection() => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        let message = match self {
            ApiError::BadRequest { message, .. } => message.clone(),
            ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::WithStatus { message: msg, .. } => msg.clone(),
            ApiError::Store(err) => err.to_string(),
            ApiError::Unexpected(err) => err.to_string(),
        };

        if message.trim().is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Source chain, outermost first, for the development-mode stack
    fn trace(&self) -> Vec<String> {
        match self {
            ApiError::Store(err) => {
                let mut trace = vec![format!("{:?}", err)];
                let mut source = std::error::Error::source(err);
                while let Some(cause) = source {
                    trace.push(cause.to_string());
                    source = std::error::Error::source(cause);
                }
                trace
            }
            ApiError::Unexpected(err) => err.chain().map(|cause| cause.to_string()).collect(),
            other => vec![format!("{:?}", other)],
        }
    }

    /// Collapse into the single shape every error response is rendered from
    pub fn normalize(self) -> NormalizedError {
        let status = self.status_code();
        let message = self.message();
        let trace = self.trace();
        let errors = match self {
            ApiError::BadRequest { errors, .. } => errors,
            _ => Vec::new(),
        };

        NormalizedError {
            status,
            message,
            errors,
            trace,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Unexpected(err)
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

/// An error reduced to what goes on the wire. It rides along in the
/// response extensions so the envelope middleware can tell rendered errors
/// from bare framework responses.
#[derive(Debug, Clone)]
pub struct NormalizedError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<FieldError>,
    pub trace: Vec<String>,
}

impl NormalizedError {
    /// Wrap a response some layer produced without going through `ApiError`
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = match body.trim() {
            "" => status
                .canonical_reason()
                .unwrap_or(DEFAULT_MESSAGE)
                .to_string(),
            text => text.to_string(),
        };

        Self {
            status,
            message,
            errors: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn envelope(&self, include_stack: bool) -> Envelope<()> {
        let stack = (include_stack && !self.trace.is_empty()).then(|| self.trace.join("\n"));
        Envelope::failure(self.status, self.message.clone(), self.errors.clone(), stack)
    }

    /// Build the response, keeping `self` in its extensions
    pub fn render(self, include_stack: bool) -> Response {
        let body = Json(self.envelope(include_stack));
        let mut response = (self.status, body).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let normalized = self.normalize();
        if normalized.status.is_server_error() {
            tracing::error!(status = %normalized.status, trace = ?normalized.trace, "{}", normalized.message);
        } else {
            tracing::debug!(status = %normalized.status, "{}", normalized.message);
        }
        normalized.render(false)
    }
}
