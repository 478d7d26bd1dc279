use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::database::models::{Comment, CommentChanges, NewComment};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Empty};
use crate::state::AppState;

use super::validate::{parse_object_id, parse_page, read_body, require_text};

const MISSING_CONTENT: &str = "All fields are required.";

#[derive(Debug, Default, Deserialize)]
pub struct ListCommentsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentBody {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub total_pages: u64,
}

/// GET /posts/:postId/comments - Page through a post's comments
pub async fn list(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(query): Query<ListCommentsQuery>,
) -> ApiResult<CommentPage> {
    let post = parse_object_id(&post_id, "postId")?;
    let page = parse_page(query.page.as_deref(), query.limit.as_deref(), &state.config.api)?;

    let comments = state.store.find_comments(post, page).await?;
    let count = state.store.count_comments(post).await?;

    Ok(ApiResponse::success(
        CommentPage {
            comments,
            total_pages: page.total_pages(count),
        },
        "Comments fetched successfully.",
    ))
}

/// POST /posts/:postId/comments - Comment on a post as the caller
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<String>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult<Comment> {
    let post = parse_object_id(&post_id, "postId")?;
    let body = read_body(body)?;
    let content = require_text(body.content, "content", MISSING_CONTENT)?;

    let comment = state
        .store
        .create_comment(NewComment {
            content,
            author: user.user_id,
            post,
        })
        .await?;

    let published = state
        .store
        .find_comment(comment.id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Something went wrong while publishing comment."))?;

    tracing::info!(comment_id = %published.id, post_id = %post, "Comment published");
    Ok(ApiResponse::created(published, "Comment published successfully."))
}

/// PATCH /comments/:commentId - Replace the comment text
pub async fn update(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult<Comment> {
    let id = parse_object_id(&comment_id, "commentId")?;
    let body = read_body(body)?;
    let content = require_text(body.content, "content", MISSING_CONTENT)?;

    let comment = state
        .store
        .update_comment(id, CommentChanges { content })
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found."))?;

    Ok(ApiResponse::success(comment, "Comment updated successfully."))
}

/// DELETE /comments/:commentId
pub async fn delete(State(state): State<AppState>, Path(comment_id): Path<String>) -> ApiResult<Empty> {
    let id = parse_object_id(&comment_id, "commentId")?;

    state
        .store
        .delete_comment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found."))?;

    tracing::info!(comment_id = %id, "Comment deleted");
    Ok(ApiResponse::success(Empty {}, "Comment deleted successfully."))
}
