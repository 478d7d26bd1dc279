use axum::{extract::rejection::JsonRejection, Json};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::database::query::{PageRequest, PostSort, PostSortField, SortDirection};
use crate::error::ApiError;

/// Parse a route parameter naming a stored entity. Only the format is
/// checked; whether the entity exists is up to the store.
pub fn parse_object_id(raw: &str, name: &str) -> Result<Uuid, ApiError> {
    let trimmed = raw.trim();
    let message = format!("{name} missing or invalid {name} format.");
    if trimmed.is_empty() {
        return Err(ApiError::invalid_field(name, message));
    }
    Uuid::parse_str(trimmed).map_err(|_| ApiError::invalid_field(name, message))
}

/// Optional `author` filter; empty means no filter
pub fn parse_author_filter(raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| ApiError::invalid_field("author", "Invalid author format.")),
    }
}

/// Required text is present and non-empty. Whitespace is kept as sent.
pub fn require_text(value: Option<String>, field: &str, message: &str) -> Result<String, ApiError> {
    match value {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ApiError::invalid_field(field, message)),
    }
}

/// Unwrap a JSON body taken as `Result<Json<T>, JsonRejection>`, so route
/// parameters are checked before the body is. A body without a JSON content
/// type reads as `T::default()` and fails on its missing fields instead.
/// Rejections that carry their own status (413, 500) keep it.
pub fn read_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection @ (JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_))) => {
            Err(ApiError::bad_request(rejection.body_text()))
        }
        Err(rejection) => Err(ApiError::with_status(rejection.status(), rejection.body_text())),
    }
}

fn positive_integer(raw: Option<&str>, field: &str, default: u64) -> Result<u64, ApiError> {
    let Some(raw) = raw.filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ApiError::invalid_field(field, format!("{field} must be a positive integer."))),
    }
}

/// `page` defaults to 1 and `limit` to the configured default; `limit` is
/// clamped to the configured maximum
pub fn parse_page(page: Option<&str>, limit: Option<&str>, api: &ApiConfig) -> Result<PageRequest, ApiError> {
    let page = positive_integer(page, "page", 1)?;
    let limit = positive_integer(limit, "limit", api.default_page_limit)?.min(api.max_page_limit);
    PageRequest::new(page, limit).ok_or_else(|| ApiError::invalid_field("page", "page is out of range."))
}

/// Sorting applies only when both the field and the direction are given
pub fn parse_post_sort(sort_by: Option<&str>, sort_type: Option<&str>) -> Result<Option<PostSort>, ApiError> {
    match (sort_by.filter(|v| !v.is_empty()), sort_type.filter(|v| !v.is_empty())) {
        (Some(field), Some(direction)) => {
            let field = PostSortField::from_param(field)
                .ok_or_else(|| ApiError::invalid_field("sortBy", format!("Cannot sort posts by '{field}'.")))?;
            Ok(Some(PostSort {
                field,
                direction: SortDirection::from_param(direction),
            }))
        }
        _ => Ok(None),
    }
}
