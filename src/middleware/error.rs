use std::any::Any;

use axum::{
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, NormalizedError};
use crate::state::AppState;

// Bare framework error bodies are short plain-text reasons
const BARE_BODY_LIMIT: usize = 16 * 1024;

/// Last stop for every error response.
///
/// Errors rendered from [`ApiError`] pass through untouched, except that
/// development mode re-renders them with their stack. Error responses built
/// elsewhere (extractor rejections, 405s, body-limit rejections) are
/// normalized here, so each failure is translated exactly once.
pub async fn error_envelope_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let include_stack = state.config.is_development();
    if let Some(normalized) = response.extensions().get::<NormalizedError>() {
        if !include_stack {
            return response;
        }
        let normalized = normalized.clone();
        let (parts, _) = response.into_parts();
        return with_headers(normalized.render(true), &parts.headers);
    }

    let (parts, body) = response.into_parts();
    let text = match axum::body::to_bytes(body, BARE_BODY_LIMIT).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    };
    let normalized = NormalizedError::from_status(status, &text);
    tracing::debug!(status = %status, "Normalized framework error: {}", normalized.message);

    with_headers(normalized.render(include_stack), &parts.headers)
}

/// Keep headers like `Allow` from the original response
fn with_headers(mut response: Response, original: &HeaderMap) -> Response {
    for (name, value) in original {
        if name == CONTENT_TYPE || name == CONTENT_LENGTH {
            continue;
        }
        response.headers_mut().append(name.clone(), value.clone());
    }
    response
}

/// Response for a panicking handler, used with `CatchPanicLayer::custom`
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::from(anyhow::anyhow!(detail).context("Request handler panicked")).into_response()
}

/// Fallback for unmatched routes
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
